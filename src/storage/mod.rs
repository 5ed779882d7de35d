use thiserror::Error;
use tracing::info;

use crate::types::{is_round_column, DataConfig, SideTable, SizeTable, WideTable};

pub mod models;

use models::{RawRecord, RoundColumns};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column {0}")]
    MissingColumn(String),

    #[error("invalid number {value:?} in column {column} at row {row}")]
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },

    #[error("invalid side {value:?} in column {column} at row {row}")]
    InvalidSide {
        column: String,
        row: usize,
        value: String,
    },

    #[error("invalid position {value:?} at row {row}")]
    InvalidPosition { row: usize, value: String },

    #[error("delimiter {0:?} is not a single-byte character")]
    Delimiter(char),
}

pub type LoadResult<T> = Result<T, LoadError>;

/// Parse a merged wide table.
///
/// Round columns are located by name, columns whose header starts with `Unnamed` (index
/// leftovers from dataframe exports) are dropped, and every remaining column is a player whose
/// cells are read with `cell`.
pub fn parse_wide_table<T>(
    text: &str,
    cfg: &DataConfig,
    cell: impl Fn(&RawRecord<'_>, usize) -> LoadResult<T>,
) -> LoadResult<WideTable<T>> {
    let delimiter = u8::try_from(cfg.delimiter).map_err(|_| LoadError::Delimiter(cfg.delimiter))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let raw_header: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let kept: Vec<usize> = (0..raw_header.len())
        .filter(|&i| !raw_header[i].starts_with("Unnamed"))
        .collect();
    let player_cols: Vec<usize> = kept
        .iter()
        .copied()
        .filter(|&i| !is_round_column(&raw_header[i]))
        .collect();
    let round_cols = RoundColumns::locate(&raw_header)?;

    let mut rounds = Vec::new();
    let mut cells: Vec<Vec<T>> = player_cols.iter().map(|_| Vec::new()).collect();

    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let raw = RawRecord {
            row: i + 1,
            header: &raw_header,
            record: &record,
        };
        rounds.push(raw.round(&round_cols, cfg.decimals)?);
        for (column, &col) in cells.iter_mut().zip(&player_cols) {
            column.push(cell(&raw, col)?);
        }
    }

    Ok(WideTable {
        columns: kept.iter().map(|&i| raw_header[i].clone()).collect(),
        rounds,
        players: player_cols.iter().map(|&i| raw_header[i].clone()).collect(),
        cells,
    })
}

pub fn parse_side_table(text: &str, cfg: &DataConfig) -> LoadResult<SideTable> {
    parse_wide_table(text, cfg, |raw, col| raw.side(col))
}

pub fn parse_size_table(text: &str, cfg: &DataConfig) -> LoadResult<SizeTable> {
    let decimals = cfg.decimals;
    parse_wide_table(text, cfg, move |raw, col| raw.amount(col, decimals))
}

async fn read_text(path: &str) -> LoadResult<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Io {
            path: path.to_string(),
            source,
        })
}

/// Read both merged tables named by `cfg`.
pub async fn load_tables(cfg: &DataConfig) -> LoadResult<(SideTable, SizeTable)> {
    let (side_text, size_text) =
        tokio::try_join!(read_text(&cfg.player_bet_path), read_text(&cfg.bet_amount_path))?;

    let sides = parse_side_table(&side_text, cfg)?;
    let sizes = parse_size_table(&size_text, cfg)?;

    let unresolved = sides
        .rounds
        .iter()
        .filter(|r| !r.position.is_settled())
        .count();
    info!(
        target: "storage",
        rounds = sides.rounds.len(),
        unresolved,
        players = sides.players.len(),
        "player tables loaded"
    );

    Ok((sides, sizes))
}
