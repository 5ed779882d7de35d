use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::types::Round;

/// Inclusive window on a round's `start_timestamp`. Open ends are unbounded.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct RoundWindow {
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
}

impl RoundWindow {
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }

    pub fn contains_ts(&self, unix_secs: i64) -> bool {
        let after_start = self.from.map_or(true, |from| unix_secs >= from.timestamp());
        let before_end = self.to.map_or(true, |to| unix_secs <= to.timestamp());
        after_start && before_end
    }

    pub fn contains(&self, round: &Round) -> bool {
        self.contains_ts(round.start_timestamp)
    }

    /// Indices of the rounds that fall inside the window, in table order.
    pub fn select(&self, rounds: &[Round]) -> Vec<usize> {
        rounds
            .iter()
            .enumerate()
            .filter(|(_, r)| self.contains(r))
            .map(|(i, _)| i)
            .collect()
    }
}
