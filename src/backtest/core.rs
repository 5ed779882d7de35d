use serde::Serialize;

use crate::{
    types::{Position, Round, Side},
    utils::math::{apply_settlement_fee, pool_multiplier, raw_profit, PROTOCOL_FEE_RATE},
};

/// One settled round as seen by a single wager.
///
/// `round` carries the pool after the wager was (optionally) injected, with `total_amount`
/// re-derived from the two sides.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationRow {
    #[serde(flatten)]
    pub round: Round,
    pub prediction: Option<Side>,
    pub bet_size: Option<f64>,
    pub bull_multiplier: f64,
    pub bear_multiplier: f64,
    pub win: bool,
    /// Multiplier of the side the round resolved to; zero for house rounds.
    pub multiplier: f64,
    /// Fee-adjusted profit; `None` when no size was wagered.
    pub profit: Option<f64>,
}

/// Settles wagers against recorded rounds under the pari-mutuel payout rule.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WagerSimulator {
    fee_rate: f64,
}

impl Default for WagerSimulator {
    fn default() -> Self {
        Self::new(PROTOCOL_FEE_RATE)
    }
}

impl WagerSimulator {
    pub fn new(fee_rate: f64) -> Self {
        Self { fee_rate }
    }

    /// Settle one wager series against `rounds`.
    ///
    /// `prediction` and `bet_size` must be aligned index-for-index with `rounds`; this is not
    /// checked here (`PlayerBook` validates alignment once, at construction). Rounds still
    /// `Unresolved` are skipped and produce no row. With `inject_into_pool` the wager's own size
    /// is added to the side it backs before multipliers are computed.
    ///
    /// Each round settles independently, so the output only depends on the inputs.
    pub fn simulate(
        &self,
        rounds: &[Round],
        prediction: &[Option<Side>],
        bet_size: &[Option<f64>],
        inject_into_pool: bool,
    ) -> Vec<SimulationRow> {
        debug_assert_eq!(rounds.len(), prediction.len());
        debug_assert_eq!(rounds.len(), bet_size.len());

        rounds
            .iter()
            .zip(prediction.iter().copied())
            .zip(bet_size.iter().copied())
            .filter(|((round, _), _)| round.position.is_settled())
            .map(|((round, side), size)| self.settle(round, side, size, inject_into_pool))
            .collect()
    }

    fn settle(
        &self,
        round: &Round,
        prediction: Option<Side>,
        bet_size: Option<f64>,
        inject_into_pool: bool,
    ) -> SimulationRow {
        let add_to_pool = if inject_into_pool {
            bet_size.unwrap_or(0.0)
        } else {
            0.0
        };

        let mut pooled = round.clone();
        match prediction {
            Some(Side::Bull) => pooled.bull_amount += add_to_pool,
            Some(Side::Bear) => pooled.bear_amount += add_to_pool,
            None => {}
        }
        pooled.total_amount = pooled.bull_amount + pooled.bear_amount;

        let bull_multiplier = pool_multiplier(pooled.total_amount, pooled.bull_amount);
        let bear_multiplier = pool_multiplier(pooled.total_amount, pooled.bear_amount);

        let win = pooled.position.pays(prediction);
        let multiplier = match pooled.position {
            Position::Bull => bull_multiplier,
            Position::Bear => bear_multiplier,
            Position::House | Position::Unresolved => 0.0,
        };

        let profit = bet_size
            .map(|size| apply_settlement_fee(raw_profit(win, multiplier, size), self.fee_rate));

        SimulationRow {
            round: pooled,
            prediction,
            bet_size,
            bull_multiplier,
            bear_multiplier,
            win,
            multiplier,
            profit,
        }
    }
}

/// Settle with the protocol fee. Convenience over [`WagerSimulator::simulate`].
pub fn simulate(
    rounds: &[Round],
    prediction: &[Option<Side>],
    bet_size: &[Option<f64>],
    inject_into_pool: bool,
) -> Vec<SimulationRow> {
    WagerSimulator::default().simulate(rounds, prediction, bet_size, inject_into_pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::math::EMPTY_POOL_MULTIPLIER;

    fn round(epoch: u64, bull: f64, bear: f64, position: Position) -> Round {
        Round {
            epoch,
            start_timestamp: 1_666_915_200 + epoch as i64 * 300,
            lock_timestamp: 1_666_915_500 + epoch as i64 * 300,
            close_timestamp: 1_666_915_800 + epoch as i64 * 300,
            lock_price: 27_000_000_000,
            close_price: 27_100_000_000,
            total_amount: bull + bear,
            bull_amount: bull,
            bear_amount: bear,
            position,
        }
    }

    fn one(r: Round, side: Option<Side>, size: Option<f64>, inject: bool) -> SimulationRow {
        let rows = simulate(&[r], &[side], &[size], inject);
        assert_eq!(rows.len(), 1);
        rows.into_iter().next().unwrap()
    }

    #[test]
    fn winning_bull_bet_pays_multiplier_less_fee() {
        let row = one(round(1, 10.0, 5.0, Position::Bull), Some(Side::Bull), Some(2.0), false);
        assert!((row.round.total_amount - 15.0).abs() < 1e-12);
        assert!((row.bull_multiplier - 1.5).abs() < 1e-12);
        assert!((row.bear_multiplier - 3.0).abs() < 1e-12);
        assert!(row.win);
        assert!((row.multiplier - 1.5).abs() < 1e-12);
        assert!((row.profit.unwrap() - 0.97).abs() < 1e-12);
    }

    #[test]
    fn losing_bet_forfeits_stake_without_fee() {
        let row = one(round(1, 10.0, 5.0, Position::Bull), Some(Side::Bear), Some(2.0), false);
        assert!(!row.win);
        assert!((row.profit.unwrap() + 2.0).abs() < 1e-12);
    }

    #[test]
    fn empty_side_uses_pinned_fallback() {
        let row = one(round(1, 0.0, 5.0, Position::Bear), Some(Side::Bull), Some(1.0), false);
        assert_eq!(row.bull_multiplier, EMPTY_POOL_MULTIPLIER);
        assert_eq!(row.bull_multiplier, 1.0);
        assert!((row.bear_multiplier - 1.0).abs() < 1e-12);
        assert!(!row.win);
        assert!((row.profit.unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn house_round_pays_nobody() {
        for side in [Some(Side::Bull), Some(Side::Bear), None] {
            let row = one(round(1, 10.0, 5.0, Position::House), side, Some(3.0), false);
            assert_eq!(row.multiplier, 0.0);
            assert!(!row.win);
            assert!((row.profit.unwrap() + 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn no_bet_leaves_pool_untouched() {
        let input = round(1, 10.0, 5.0, Position::Bull);
        for inject in [false, true] {
            let row = one(input.clone(), None, None, inject);
            assert_eq!(row.round.bull_amount, input.bull_amount);
            assert_eq!(row.round.bear_amount, input.bear_amount);
            assert!(!row.win);
            assert!(row.profit.is_none());
        }
    }

    #[test]
    fn size_without_side_settles_as_a_loss() {
        let input = round(1, 10.0, 5.0, Position::Bull);
        for inject in [false, true] {
            let row = one(input.clone(), None, Some(2.0), inject);
            assert!(!row.win);
            assert_eq!(row.profit, Some(-2.0));
            assert_eq!(row.round.bull_amount, input.bull_amount);
            assert_eq!(row.round.bear_amount, input.bear_amount);
            assert_eq!(row.round.total_amount, 15.0);
        }
    }

    #[test]
    fn injection_dilutes_the_winning_side() {
        let r = round(1, 10.0, 5.0, Position::Bull);
        let plain = one(r.clone(), Some(Side::Bull), Some(5.0), false);
        let injected = one(r, Some(Side::Bull), Some(5.0), true);

        assert!((injected.round.bull_amount - 15.0).abs() < 1e-12);
        assert!((injected.round.total_amount - 20.0).abs() < 1e-12);
        assert!((injected.bull_multiplier - 20.0 / 15.0).abs() < 1e-12);
        assert!(injected.multiplier < plain.multiplier);
        assert!(injected.profit.unwrap() < plain.profit.unwrap());
        assert_eq!(injected.win, plain.win);
    }

    #[test]
    fn injection_into_empty_side_removes_fallback() {
        let row = one(round(1, 0.0, 5.0, Position::Bull), Some(Side::Bull), Some(5.0), true);
        assert!((row.bull_multiplier - 2.0).abs() < 1e-12);
        assert!((row.profit.unwrap() - 5.0 * 0.97).abs() < 1e-12);
    }

    #[test]
    fn pool_is_conserved_after_mutation() {
        let rounds = vec![
            round(1, 10.0, 5.0, Position::Bull),
            round(2, 0.0, 3.0, Position::Bear),
            round(3, 7.5, 0.0, Position::House),
        ];
        let sides = vec![Some(Side::Bull), Some(Side::Bear), None];
        let sizes = vec![Some(1.0), Some(2.5), None];
        for inject in [false, true] {
            for row in simulate(&rounds, &sides, &sizes, inject) {
                let expected = row.round.bull_amount + row.round.bear_amount;
                assert_eq!(row.round.total_amount, expected);
            }
        }
    }

    #[test]
    fn stale_total_amount_is_rederived() {
        let mut r = round(1, 10.0, 5.0, Position::Bull);
        r.total_amount = 999.0;
        let row = one(r, Some(Side::Bull), Some(1.0), false);
        assert!((row.round.total_amount - 15.0).abs() < 1e-12);
    }

    #[test]
    fn unresolved_rounds_are_skipped() {
        let rounds = vec![
            round(1, 10.0, 5.0, Position::Bull),
            round(2, 10.0, 5.0, Position::Unresolved),
            round(3, 10.0, 5.0, Position::Bear),
        ];
        let sides = vec![Some(Side::Bull); 3];
        let sizes = vec![Some(1.0); 3];
        let rows = simulate(&rounds, &sides, &sizes, false);
        let epochs: Vec<u64> = rows.iter().map(|r| r.round.epoch).collect();
        assert_eq!(epochs, vec![1, 3]);
    }

    #[test]
    fn side_without_size_has_no_profit() {
        let row = one(round(1, 10.0, 5.0, Position::Bull), Some(Side::Bull), None, true);
        assert!(row.win);
        assert!(row.profit.is_none());
        assert_eq!(row.round.bull_amount, 10.0);
    }

    #[test]
    fn input_rounds_are_not_mutated() {
        let rounds = vec![round(1, 10.0, 5.0, Position::Bull)];
        let before = rounds.clone();
        let _ = simulate(&rounds, &[Some(Side::Bull)], &[Some(4.0)], true);
        assert_eq!(rounds, before);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let rounds = vec![
            round(1, 10.0, 5.0, Position::Bull),
            round(2, 1.0, 3.0, Position::Bear),
        ];
        let sides = vec![Some(Side::Bull), Some(Side::Bull)];
        let sizes = vec![Some(0.3), Some(1.7)];
        let a = simulate(&rounds, &sides, &sizes, true);
        let b = simulate(&rounds, &sides, &sizes, true);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn custom_fee_rate_applies_to_winnings() {
        let sim = WagerSimulator::new(0.0);
        let rows = sim.simulate(
            &[round(1, 10.0, 5.0, Position::Bull)],
            &[Some(Side::Bull)],
            &[Some(2.0)],
            false,
        );
        assert!((rows[0].profit.unwrap() - 1.0).abs() < 1e-12);
    }
}
