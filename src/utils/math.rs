/// Share of positive profit the prediction contract keeps on settlement.
pub const PROTOCOL_FEE_RATE: f64 = 0.03;

/// Multiplier reported for a pool side nobody bet on.
///
/// Only a wager on that side can consult it, and such a wager makes the side non-empty
/// once injected, so the value only surfaces for non-injecting simulations.
pub const EMPTY_POOL_MULTIPLIER: f64 = 1.0;

/// Pari-mutuel payout factor of one side: `total / side`, or the empty-pool fallback.
pub fn pool_multiplier(total_amount: f64, side_amount: f64) -> f64 {
    if side_amount > 0.0 {
        total_amount / side_amount
    } else {
        EMPTY_POOL_MULTIPLIER
    }
}

/// Gross profit of a settled wager: the payout on a win minus the stake, win or lose.
pub fn raw_profit(win: bool, multiplier: f64, bet_size: f64) -> f64 {
    let payout = if win { multiplier * bet_size } else { 0.0 };
    payout - bet_size
}

/// Deduct the protocol fee from strictly positive profit. Losses and break-even are untouched.
pub fn apply_settlement_fee(profit: f64, fee_rate: f64) -> f64 {
    if profit > 0.0 {
        profit * (1.0 - fee_rate)
    } else {
        profit
    }
}

/// Convert an on-chain fixed-point amount into a plain decimal value.
pub fn from_fixed_point(raw: f64, decimals: u32) -> f64 {
    raw / 10f64.powi(decimals as i32)
}
