use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    backtest::{
        core::{SimulationRow, WagerSimulator},
        BacktestError, BacktestResult,
    },
    monitoring::metrics::METRICS,
    types::{Round, Side, SideTable, SizeTable},
    utils::time::RoundWindow,
};

/// One player's (or strategy's) wagers, aligned with the book's rounds.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerSeries {
    pub player: String,
    pub sides: Vec<Option<Side>>,
    pub sizes: Vec<Option<f64>>,
}

/// Round table plus the ordered set of player series, validated once at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerBook {
    rounds: Vec<Round>,
    players: Vec<PlayerSeries>,
}

#[derive(Clone, Debug)]
pub struct PlayerBookBuilder {
    rounds: Vec<Round>,
    players: Vec<PlayerSeries>,
}

impl PlayerBookBuilder {
    pub fn player(
        mut self,
        player: impl Into<String>,
        sides: Vec<Option<Side>>,
        sizes: Vec<Option<f64>>,
    ) -> Self {
        self.players.push(PlayerSeries {
            player: player.into(),
            sides,
            sizes,
        });
        self
    }

    pub fn build(self) -> BacktestResult<PlayerBook> {
        let expected = self.rounds.len();
        let mut seen = HashSet::new();
        for series in &self.players {
            if !seen.insert(series.player.as_str()) {
                return Err(BacktestError::DuplicatePlayer(series.player.clone()));
            }
            if series.sides.len() != expected || series.sizes.len() != expected {
                return Err(BacktestError::SeriesLength {
                    player: series.player.clone(),
                    expected,
                    sides: series.sides.len(),
                    sizes: series.sizes.len(),
                });
            }
        }
        Ok(PlayerBook {
            rounds: self.rounds,
            players: self.players,
        })
    }
}

impl PlayerBook {
    pub fn builder(rounds: Vec<Round>) -> PlayerBookBuilder {
        PlayerBookBuilder {
            rounds,
            players: Vec::new(),
        }
    }

    /// Pair the side and size tables column by column.
    ///
    /// Both tables must carry the same header in the same order and the same epoch sequence;
    /// anything else is a hard error. Round fields are taken from the side table.
    pub fn from_tables(sides: SideTable, sizes: SizeTable) -> BacktestResult<Self> {
        if sides.columns != sizes.columns {
            return Err(BacktestError::ColumnMismatch {
                sides: sides.columns,
                sizes: sizes.columns,
            });
        }
        if let Some(index) = first_epoch_mismatch(&sides.rounds, &sizes.rounds) {
            return Err(BacktestError::RoundMismatch {
                index,
                side_epoch: sides.rounds.get(index).map_or(0, |r| r.epoch),
                size_epoch: sizes.rounds.get(index).map_or(0, |r| r.epoch),
            });
        }

        sides
            .players
            .into_iter()
            .zip(sides.cells)
            .zip(sizes.cells)
            .fold(PlayerBook::builder(sides.rounds), |builder, ((player, s), z)| {
                builder.player(player, s, z)
            })
            .build()
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn players(&self) -> &[PlayerSeries] {
        &self.players
    }

    pub fn player(&self, player: &str) -> Option<&PlayerSeries> {
        self.players.iter().find(|s| s.player == player)
    }

    pub fn retain_players(mut self, keep: impl Fn(&str) -> bool) -> PlayerBook {
        self.players.retain(|s| keep(&s.player));
        self
    }

    /// Keep only the rounds whose start falls inside `window`, slicing every series alongside.
    pub fn within(&self, window: &RoundWindow) -> PlayerBook {
        let keep = window.select(&self.rounds);
        PlayerBook {
            rounds: keep.iter().map(|&i| self.rounds[i].clone()).collect(),
            players: self
                .players
                .iter()
                .map(|s| PlayerSeries {
                    player: s.player.clone(),
                    sides: keep.iter().map(|&i| s.sides[i]).collect(),
                    sizes: keep.iter().map(|&i| s.sizes[i]).collect(),
                })
                .collect(),
        }
    }
}

fn first_epoch_mismatch(a: &[Round], b: &[Round]) -> Option<usize> {
    let common = a.len().min(b.len());
    (0..common)
        .find(|&i| a[i].epoch != b[i].epoch)
        .or_else(|| (a.len() != b.len()).then_some(common))
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlayerMetrics {
    pub player: String,
    pub win_ratio: f64,
    pub total_bets: usize,
    pub total_profit: f64,
    pub profit_per_bet: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No round in range carries a wagered size.
    NoBets,
    /// A wagered size produced a NaN or infinite profit.
    NonFiniteProfit,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SkippedPlayer {
    pub player: String,
    pub reason: SkipReason,
}

impl PlayerMetrics {
    /// Reduce simulated rows to summary statistics over the rounds that carry a size.
    pub fn from_rows(player: &str, rows: &[SimulationRow]) -> Result<Self, SkipReason> {
        let bets: Vec<(bool, f64)> = rows
            .iter()
            .filter_map(|row| row.profit.map(|p| (row.win, p)))
            .collect();

        if bets.is_empty() {
            return Err(SkipReason::NoBets);
        }

        let total_bets = bets.len();
        let wins = bets.iter().filter(|(win, _)| *win).count();
        let total_profit: f64 = bets.iter().map(|(_, p)| p).sum();
        if !total_profit.is_finite() {
            return Err(SkipReason::NonFiniteProfit);
        }

        Ok(Self {
            player: player.to_string(),
            win_ratio: wins as f64 / total_bets as f64,
            total_bets,
            total_profit,
            profit_per_bet: total_profit / total_bets as f64,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MetricsReport {
    pub metrics: Vec<PlayerMetrics>,
    pub skipped: Vec<SkippedPlayer>,
}

impl MetricsReport {
    /// Players with at least `min_bets` bets, most active first, capped at `top` when given.
    pub fn leaderboard(&self, min_bets: usize, top: Option<usize>) -> Vec<&PlayerMetrics> {
        let mut board: Vec<&PlayerMetrics> = self
            .metrics
            .iter()
            .filter(|m| m.total_bets >= min_bets)
            .collect();
        board.sort_by(|a, b| {
            b.total_bets
                .cmp(&a.total_bets)
                .then_with(|| a.player.cmp(&b.player))
        });
        if let Some(n) = top {
            board.truncate(n);
        }
        board
    }
}

/// Evaluate every player in the book without injecting their wagers into the pool.
///
/// Recorded pools already contain each player's historical stake, so adding it again would
/// double count. A player with nothing to evaluate is reported in `skipped` and does not
/// affect the others.
pub fn compute_metrics(book: &PlayerBook, simulator: &WagerSimulator) -> MetricsReport {
    let mut report = MetricsReport::default();

    for series in book.players() {
        let rows = simulator.simulate(book.rounds(), &series.sides, &series.sizes, false);
        METRICS.record_rounds_simulated(rows.len());

        match PlayerMetrics::from_rows(&series.player, &rows) {
            Ok(m) => {
                debug!(
                    target: "metrics",
                    player = %m.player,
                    total_bets = m.total_bets,
                    total_profit = m.total_profit,
                    "player evaluated"
                );
                METRICS.record_player_evaluated();
                report.metrics.push(m);
            }
            Err(reason) => {
                warn!(
                    target: "metrics",
                    player = %series.player,
                    reason = ?reason,
                    "player skipped"
                );
                METRICS.record_player_skipped();
                report.skipped.push(SkippedPlayer {
                    player: series.player.clone(),
                    reason,
                });
            }
        }
    }

    report
}
