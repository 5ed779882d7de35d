pub mod backtest;
pub mod monitoring;
pub mod storage;
pub mod types;
pub mod utils;

pub use crate::types::*;
