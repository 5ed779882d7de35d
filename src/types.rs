use std::fmt;
use std::fs;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Round-metadata columns of the merged wide tables. Every other column is a player.
pub const ROUND_COLUMNS: [&str; 10] = [
    "epoch",
    "start_timestamp",
    "lock_timestamp",
    "close_timestamp",
    "lock_price",
    "close_price",
    "total_amount",
    "bull_amount",
    "bear_amount",
    "position",
];

pub fn is_round_column(name: &str) -> bool {
    ROUND_COLUMNS.contains(&name)
}

/// Side a wager can be placed on.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Side {
    Bull,
    Bear,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bull => write!(f, "Bull"),
            Side::Bear => write!(f, "Bear"),
        }
    }
}

/// Resolution of a round.
///
/// `House` is a tie (`lock_price == close_price`): nobody is paid. `Unresolved` rounds have
/// no settlement yet and are never simulated.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Position {
    Bull,
    Bear,
    House,
    #[default]
    Unresolved,
}

impl Position {
    /// Resolve a round from its lock and close prices.
    pub fn from_prices(lock_price: i64, close_price: i64) -> Self {
        match lock_price.cmp(&close_price) {
            std::cmp::Ordering::Less => Position::Bull,
            std::cmp::Ordering::Greater => Position::Bear,
            std::cmp::Ordering::Equal => Position::House,
        }
    }

    pub fn is_settled(self) -> bool {
        !matches!(self, Position::Unresolved)
    }

    /// True only when the wagered side is the side the round resolved to.
    pub fn pays(self, side: Option<Side>) -> bool {
        matches!(
            (self, side),
            (Position::Bull, Some(Side::Bull)) | (Position::Bear, Some(Side::Bear))
        )
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Bull => write!(f, "Bull"),
            Position::Bear => write!(f, "Bear"),
            Position::House => write!(f, "House"),
            Position::Unresolved => write!(f, "Unresolved"),
        }
    }
}

/// One settlement epoch with its recorded pool state.
///
/// Pool amounts are already normalized from the on-chain fixed-point representation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub epoch: u64,
    pub start_timestamp: i64,
    pub lock_timestamp: i64,
    pub close_timestamp: i64,
    pub lock_price: i64,
    pub close_price: i64,
    pub total_amount: f64,
    pub bull_amount: f64,
    pub bear_amount: f64,
    pub position: Position,
}

/// A merged per-epoch table: round fields plus one cell column per player.
///
/// `columns` is the header as loaded (round columns included, in file order); `players` and
/// `cells` are parallel, and every `cells[i]` is aligned with `rounds`.
#[derive(Clone, Debug, PartialEq)]
pub struct WideTable<T> {
    pub columns: Vec<String>,
    pub rounds: Vec<Round>,
    pub players: Vec<String>,
    pub cells: Vec<Vec<T>>,
}

/// Wagered side per player and epoch.
pub type SideTable = WideTable<Option<Side>>;

/// Wagered size per player and epoch.
pub type SizeTable = WideTable<Option<f64>>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    /// Wide table holding each player's wagered side per epoch.
    pub player_bet_path: String,
    /// Wide table holding each player's wagered size per epoch.
    pub bet_amount_path: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Fixed-point decimals of pool and size cells (18 for on-chain token amounts).
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

fn default_delimiter() -> char {
    ','
}

fn default_decimals() -> u32 {
    18
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// Share of positive profit retained by the protocol.
    #[serde(default = "default_fee_rate")]
    pub fee_rate: f64,
}

fn default_fee_rate() -> f64 {
    crate::utils::math::PROTOCOL_FEE_RATE
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            fee_rate: default_fee_rate(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub data: DataConfig,
    #[serde(default)]
    pub settlement: SettlementConfig,
}

impl SettlementConfig {
    /// The fee may only shrink winnings: `fee_rate` must lie in `[0, 1)`.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..1.0).contains(&self.fee_rate) {
            anyhow::bail!("fee_rate must be in [0, 1), got {}", self.fee_rate);
        }
        Ok(())
    }
}

impl AppConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file at {path}"))?;
        Self::from_toml_str(&contents).with_context(|| format!("invalid config at {path}"))
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: Self = toml::from_str(contents).context("failed to deserialize TOML config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Re-run after any override of loaded values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.settlement
            .validate()
            .context("invalid [settlement] section")
    }
}
