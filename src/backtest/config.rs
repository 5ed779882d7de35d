use std::fs;

use anyhow::Context;
use serde::Deserialize;

use crate::utils::time::RoundWindow;

/// Top-level backtest configuration loaded from TOML.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BacktestConfig {
    /// Rounds are kept when their `start_timestamp` falls inside this window.
    #[serde(default)]
    pub window: RoundWindow,
    /// Leaderboard entries need at least this many bets.
    #[serde(default)]
    pub min_bets: usize,
    /// Cap on leaderboard length.
    #[serde(default)]
    pub top: Option<usize>,
    /// Restrict evaluation to these players. Empty means everyone.
    #[serde(default)]
    pub players: Vec<String>,
}

impl BacktestConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read backtest config file at {path}"))?;
        let cfg: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to deserialize backtest TOML at {path}"))?;
        Ok(cfg)
    }

    pub fn includes(&self, player: &str) -> bool {
        self.players.is_empty() || self.players.iter().any(|p| p == player)
    }
}
