use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

use parimutuel_backtest::{
    backtest::{self, BacktestConfig},
    monitoring,
    types::AppConfig,
};

#[derive(Parser, Debug)]
#[command(name = "parimutuel-backtest")]
#[command(
    about = "Backtest Bull/Bear pari-mutuel wagers against recorded rounds",
    long_about = None
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.toml")]
    config: String,

    /// Override the protocol fee taken from winnings
    #[arg(long)]
    fee_rate: Option<f64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute per-player metrics and log the leaderboard
    Metrics {
        /// Optional path to backtest configuration
        #[arg(short, long)]
        backtest_config: Option<String>,
    },
    /// Mirror one player's bets with fresh capital
    CopyTrade {
        /// Player address (column name in the merged tables)
        #[arg(short, long)]
        player: String,
        /// Optional path to backtest configuration
        #[arg(short, long)]
        backtest_config: Option<String>,
    },
}

fn load_backtest_config(path: Option<String>) -> anyhow::Result<BacktestConfig> {
    match path {
        Some(path) => BacktestConfig::from_file(&path),
        None => Ok(BacktestConfig::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "parimutuel_backtest=debug,app=debug,info");
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();
    tracing::debug!(target: "app", config = %cli.config, "loading config");

    let mut settings = AppConfig::from_file(&cli.config)?;
    if let Some(fee_rate) = cli.fee_rate {
        settings.settlement.fee_rate = fee_rate;
    }
    settings
        .validate()
        .with_context(|| format!("invalid settings after CLI overrides ({})", cli.config))?;

    match cli.command.unwrap_or(Commands::Metrics {
        backtest_config: None,
    }) {
        Commands::Metrics { backtest_config } => {
            let backtest_cfg = load_backtest_config(backtest_config)?;
            monitoring::logger::log_startup(&settings, &backtest_cfg, "metrics");
            backtest::runner::run_metrics(settings, backtest_cfg).await?;
        }
        Commands::CopyTrade {
            player,
            backtest_config,
        } => {
            let backtest_cfg = load_backtest_config(backtest_config)?;
            monitoring::logger::log_startup(&settings, &backtest_cfg, "copy-trade");
            backtest::runner::run_copy_trade(settings, backtest_cfg, &player).await?;
        }
    }

    Ok(())
}
