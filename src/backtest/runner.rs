use anyhow::Context;
use tracing::{info, warn};

use crate::{
    backtest::{
        config::BacktestConfig,
        copy_trade::{compare_copy_trade, CopyTradeComparison},
        core::WagerSimulator,
        metrics::{compute_metrics, MetricsReport, PlayerBook},
    },
    monitoring::{
        logger::{log_copy_trade, log_leaderboard},
        metrics::{log_metrics_snapshot, METRICS},
    },
    storage::load_tables,
    types::AppConfig,
};

/// Load both merged tables, pair them into a book and narrow it to the configured window.
pub async fn load_book(app: &AppConfig, cfg: &BacktestConfig) -> anyhow::Result<PlayerBook> {
    app.validate()?;
    let (sides, sizes) = load_tables(&app.data)
        .await
        .context("failed to load player tables")?;

    let book = PlayerBook::from_tables(sides, sizes)
        .context("player bet and bet amount tables do not line up")?
        .within(&cfg.window)
        .retain_players(|p| cfg.includes(p));

    info!(
        target: "backtest",
        rounds = book.rounds().len(),
        players = book.players().len(),
        "book ready"
    );
    Ok(book)
}

/// Evaluate every player and log the leaderboard.
pub async fn run_metrics(app: AppConfig, cfg: BacktestConfig) -> anyhow::Result<MetricsReport> {
    let book = load_book(&app, &cfg).await?;
    let simulator = WagerSimulator::new(app.settlement.fee_rate);

    let report = compute_metrics(&book, &simulator);
    let board = report.leaderboard(cfg.min_bets, cfg.top);
    log_leaderboard(&report, &board, book.rounds().len());
    log_metrics_snapshot(&METRICS.snapshot());

    Ok(report)
}

/// Mirror one player's bets and log how the result compares with their own.
pub async fn run_copy_trade(
    app: AppConfig,
    cfg: BacktestConfig,
    player: &str,
) -> anyhow::Result<Option<CopyTradeComparison>> {
    let book = load_book(&app, &cfg).await?;
    let simulator = WagerSimulator::new(app.settlement.fee_rate);

    match compare_copy_trade(&book, &simulator, player)? {
        Ok(comparison) => {
            log_copy_trade(&comparison);
            Ok(Some(comparison))
        }
        Err(reason) => {
            warn!(target: "backtest", player, reason = ?reason, "nothing to copy");
            Ok(None)
        }
    }
}
