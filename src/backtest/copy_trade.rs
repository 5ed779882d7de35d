use serde::Serialize;

use crate::{
    backtest::{
        core::{SimulationRow, WagerSimulator},
        metrics::{PlayerBook, PlayerMetrics, SkipReason},
        BacktestError, BacktestResult,
    },
    types::{Round, Side},
};

/// Mirror a wager series with fresh capital: the same settlement as the metrics path, except
/// that every mirrored stake is added to the pool it joins before payouts are computed.
pub fn copy_trade(
    simulator: &WagerSimulator,
    rounds: &[Round],
    prediction: &[Option<Side>],
    bet_size: &[Option<f64>],
) -> Vec<SimulationRow> {
    simulator.simulate(rounds, prediction, bet_size, true)
}

/// What a player earned on their own versus what mirroring them would have earned.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CopyTradeComparison {
    pub player: String,
    pub own: PlayerMetrics,
    pub mirrored: PlayerMetrics,
    /// Profit lost to diluting the pool: `own.total_profit - mirrored.total_profit`.
    pub dilution: f64,
}

/// Copy-trade one player of the book and compare against their recorded results.
///
/// Returns `Ok(Err(reason))` when the player exists but has nothing to evaluate.
pub fn compare_copy_trade(
    book: &PlayerBook,
    simulator: &WagerSimulator,
    player: &str,
) -> BacktestResult<Result<CopyTradeComparison, SkipReason>> {
    let series = book
        .player(player)
        .ok_or_else(|| BacktestError::UnknownPlayer(player.to_string()))?;

    let own_rows = simulator.simulate(book.rounds(), &series.sides, &series.sizes, false);
    let mirrored_rows = copy_trade(simulator, book.rounds(), &series.sides, &series.sizes);

    let comparison = PlayerMetrics::from_rows(player, &own_rows).and_then(|own| {
        let mirrored = PlayerMetrics::from_rows(player, &mirrored_rows)?;
        Ok(CopyTradeComparison {
            player: player.to_string(),
            dilution: own.total_profit - mirrored.total_profit,
            own,
            mirrored,
        })
    });

    Ok(comparison)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Position;

    fn round(epoch: u64, bull: f64, bear: f64, position: Position) -> Round {
        Round {
            epoch,
            start_timestamp: 0,
            lock_timestamp: 0,
            close_timestamp: 0,
            lock_price: 0,
            close_price: 0,
            total_amount: bull + bear,
            bull_amount: bull,
            bear_amount: bear,
            position,
        }
    }

    #[test]
    fn copy_trade_differs_from_plain_simulation_only_in_pool() {
        let sim = WagerSimulator::default();
        let rounds = vec![
            round(1, 10.0, 5.0, Position::Bull),
            round(2, 4.0, 6.0, Position::Bear),
            round(3, 2.0, 2.0, Position::House),
        ];
        let sides = vec![Some(Side::Bull), Some(Side::Bull), Some(Side::Bear)];
        let sizes = vec![Some(2.0), Some(1.0), Some(3.0)];

        let plain = sim.simulate(&rounds, &sides, &sizes, false);
        let copied = copy_trade(&sim, &rounds, &sides, &sizes);

        assert_eq!(copied, sim.simulate(&rounds, &sides, &sizes, true));
        for (p, c) in plain.iter().zip(&copied) {
            assert_eq!(p.win, c.win);
            assert_eq!(p.prediction, c.prediction);
            assert_eq!(p.bet_size, c.bet_size);
            assert_eq!(p.round.position, c.round.position);
        }
        assert!((copied[0].round.bull_amount - 12.0).abs() < 1e-12);
        assert!((copied[1].round.bull_amount - 5.0).abs() < 1e-12);
        assert!((copied[2].round.bear_amount - 5.0).abs() < 1e-12);
        assert!(copied[0].multiplier < plain[0].multiplier);
    }

    #[test]
    fn comparison_reports_dilution() {
        let book = PlayerBook::builder(vec![round(1, 10.0, 5.0, Position::Bull)])
            .player("alice", vec![Some(Side::Bull)], vec![Some(5.0)])
            .build()
            .unwrap();

        let cmp = compare_copy_trade(&book, &WagerSimulator::default(), "alice")
            .unwrap()
            .unwrap();
        // own: 5 * 1.5 - 5 = 2.5; mirrored: 5 * 20/15 - 5 = 1.666..
        assert!((cmp.own.total_profit - 2.5 * 0.97).abs() < 1e-9);
        assert!((cmp.mirrored.total_profit - (5.0 / 3.0) * 0.97).abs() < 1e-9);
        assert!(cmp.dilution > 0.0);
    }

    #[test]
    fn unknown_player_is_an_error() {
        let book = PlayerBook::builder(vec![round(1, 1.0, 1.0, Position::Bull)])
            .build()
            .unwrap();
        let err = compare_copy_trade(&book, &WagerSimulator::default(), "nobody").unwrap_err();
        assert_eq!(err, BacktestError::UnknownPlayer("nobody".to_string()));
    }

    #[test]
    fn player_without_bets_is_soft() {
        let book = PlayerBook::builder(vec![round(1, 1.0, 1.0, Position::Bull)])
            .player("idle", vec![None], vec![None])
            .build()
            .unwrap();
        let res = compare_copy_trade(&book, &WagerSimulator::default(), "idle").unwrap();
        assert_eq!(res.unwrap_err(), SkipReason::NoBets);
    }
}
