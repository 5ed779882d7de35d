use thiserror::Error;

pub mod config;
pub mod copy_trade;
pub mod core;
pub mod metrics;
pub mod runner;

pub use config::BacktestConfig;
pub use copy_trade::{compare_copy_trade, copy_trade, CopyTradeComparison};
pub use self::core::{simulate, SimulationRow, WagerSimulator};
pub use metrics::{
    compute_metrics, MetricsReport, PlayerBook, PlayerBookBuilder, PlayerMetrics, PlayerSeries,
    SkipReason, SkippedPlayer,
};

#[derive(Debug, Error, PartialEq)]
pub enum BacktestError {
    #[error("player tables disagree on columns: sides={sides:?} sizes={sizes:?}")]
    ColumnMismatch {
        sides: Vec<String>,
        sizes: Vec<String>,
    },

    #[error("player tables disagree on rounds at row {index}: epoch {side_epoch} vs {size_epoch}")]
    RoundMismatch {
        index: usize,
        side_epoch: u64,
        size_epoch: u64,
    },

    #[error("player {player} is not aligned to {expected} rounds (sides={sides}, sizes={sizes})")]
    SeriesLength {
        player: String,
        expected: usize,
        sides: usize,
        sizes: usize,
    },

    #[error("player {0} appears more than once")]
    DuplicatePlayer(String),

    #[error("unknown player {0}")]
    UnknownPlayer(String),
}

pub type BacktestResult<T> = Result<T, BacktestError>;
