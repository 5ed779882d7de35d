use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::Serialize;
use tracing::info;

/// Process-wide counters for the current run.
pub static METRICS: Lazy<Metrics> = Lazy::new(Metrics::default);

#[derive(Default)]
struct MetricsInner {
    rounds_simulated: AtomicU64,
    players_evaluated: AtomicU64,
    players_skipped: AtomicU64,
}

/// Lightweight metrics handle backed by atomics so it can be cloned cheaply.
#[derive(Clone, Default)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

impl Metrics {
    pub fn record_rounds_simulated(&self, rounds: usize) {
        self.inner
            .rounds_simulated
            .fetch_add(rounds as u64, Ordering::Relaxed);
    }

    pub fn record_player_evaluated(&self) {
        self.inner.players_evaluated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_player_skipped(&self) {
        self.inner.players_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rounds_simulated: self.inner.rounds_simulated.load(Ordering::Relaxed),
            players_evaluated: self.inner.players_evaluated.load(Ordering::Relaxed),
            players_skipped: self.inner.players_skipped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub rounds_simulated: u64,
    pub players_evaluated: u64,
    pub players_skipped: u64,
}

pub fn log_metrics_snapshot(snapshot: &MetricsSnapshot) {
    info!(
        target: "metrics",
        event = "metrics_snapshot",
        rounds_simulated = snapshot.rounds_simulated,
        players_evaluated = snapshot.players_evaluated,
        players_skipped = snapshot.players_skipped,
        "metrics snapshot"
    );
}
