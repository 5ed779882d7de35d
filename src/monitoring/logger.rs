use serde::Serialize;
use tracing::info;

use crate::{
    backtest::{BacktestConfig, CopyTradeComparison, MetricsReport, PlayerMetrics},
    types::AppConfig,
};

#[derive(Serialize)]
struct StartupLog<'a> {
    event: &'a str,
    command: &'a str,
    player_bet_path: &'a str,
    bet_amount_path: &'a str,
    fee_rate: f64,
    window_from: Option<String>,
    window_to: Option<String>,
}

pub fn log_startup(cfg: &AppConfig, backtest: &BacktestConfig, command: &str) {
    let payload = StartupLog {
        event: "startup",
        command,
        player_bet_path: &cfg.data.player_bet_path,
        bet_amount_path: &cfg.data.bet_amount_path,
        fee_rate: cfg.settlement.fee_rate,
        window_from: backtest.window.from.map(|t| t.to_rfc3339()),
        window_to: backtest.window.to.map(|t| t.to_rfc3339()),
    };
    info!(target: "app", startup = serde_json::to_string(&payload).unwrap_or_default().as_str());
}

#[derive(Serialize)]
struct PlayerLog<'a> {
    event: &'a str,
    rank: usize,
    #[serde(flatten)]
    metrics: &'a PlayerMetrics,
}

#[derive(Serialize)]
struct MetricsSummary<'a> {
    event: &'a str,
    rounds: usize,
    players_evaluated: usize,
    players_skipped: usize,
    leaderboard: usize,
}

/// Log the leaderboard one player per line, followed by a run summary.
pub fn log_leaderboard(report: &MetricsReport, board: &[&PlayerMetrics], rounds: usize) {
    for (i, m) in board.iter().enumerate() {
        let line = PlayerLog {
            event: "player_metrics",
            rank: i + 1,
            metrics: m,
        };
        let payload = serde_json::to_string(&line)
            .unwrap_or_else(|_| "{\"event\":\"player_metrics_error\"}".to_string());
        info!(target: "backtest", "{payload}");
    }

    let summary = MetricsSummary {
        event: "metrics_summary",
        rounds,
        players_evaluated: report.metrics.len(),
        players_skipped: report.skipped.len(),
        leaderboard: board.len(),
    };
    let payload = serde_json::to_string(&summary)
        .unwrap_or_else(|_| "{\"event\":\"metrics_summary_error\"}".to_string());
    info!(target: "backtest", "{payload}");
}

#[derive(Serialize)]
struct CopyTradeSummary<'a> {
    event: &'a str,
    #[serde(flatten)]
    comparison: &'a CopyTradeComparison,
}

pub fn log_copy_trade(comparison: &CopyTradeComparison) {
    let summary = CopyTradeSummary {
        event: "copy_trade_summary",
        comparison,
    };
    let payload = serde_json::to_string(&summary)
        .unwrap_or_else(|_| "{\"event\":\"copy_trade_summary_error\"}".to_string());
    info!(target: "backtest", "{payload}");
}
