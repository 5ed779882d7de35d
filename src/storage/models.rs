use std::collections::HashMap;

use crate::{
    storage::LoadError,
    types::{Position, Round, Side},
    utils::math::from_fixed_point,
};

/// Header positions of the round columns within a merged table.
#[derive(Clone, Debug)]
pub struct RoundColumns {
    epoch: usize,
    start_timestamp: usize,
    lock_timestamp: usize,
    close_timestamp: usize,
    lock_price: usize,
    close_price: usize,
    total_amount: usize,
    bull_amount: usize,
    bear_amount: usize,
    position: usize,
}

impl RoundColumns {
    pub fn locate(header: &[String]) -> Result<Self, LoadError> {
        let index: HashMap<&str, usize> = header
            .iter()
            .enumerate()
            .map(|(i, h)| (h.as_str(), i))
            .collect();
        let find = |name: &str| {
            index
                .get(name)
                .copied()
                .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            epoch: find("epoch")?,
            start_timestamp: find("start_timestamp")?,
            lock_timestamp: find("lock_timestamp")?,
            close_timestamp: find("close_timestamp")?,
            lock_price: find("lock_price")?,
            close_price: find("close_price")?,
            total_amount: find("total_amount")?,
            bull_amount: find("bull_amount")?,
            bear_amount: find("bear_amount")?,
            position: find("position")?,
        })
    }
}

/// One CSV record as seen by the cell parsers, with its position for error reporting.
pub struct RawRecord<'a> {
    pub row: usize,
    pub header: &'a [String],
    pub record: &'a csv::StringRecord,
}

impl<'a> RawRecord<'a> {
    fn cell(&self, col: usize) -> &'a str {
        self.record.get(col).unwrap_or("").trim()
    }

    fn invalid_number(&self, col: usize) -> LoadError {
        LoadError::InvalidNumber {
            column: self.header[col].clone(),
            row: self.row,
            value: self.cell(col).to_string(),
        }
    }

    /// Integer cell; tolerates integral floats such as `12.0` written by dataframe exports.
    pub fn int(&self, col: usize) -> Result<i64, LoadError> {
        let raw = self.cell(col);
        if let Ok(v) = raw.parse::<i64>() {
            return Ok(v);
        }
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as i64),
            _ => Err(self.invalid_number(col)),
        }
    }

    /// Fixed-point amount cell normalized by `decimals`; blank and `nan` read as absent.
    pub fn amount(&self, col: usize, decimals: u32) -> Result<Option<f64>, LoadError> {
        let raw = self.cell(col);
        if is_missing(raw) {
            return Ok(None);
        }
        raw.parse::<f64>()
            .map(|v| Some(from_fixed_point(v, decimals)))
            .map_err(|_| self.invalid_number(col))
    }

    pub fn side(&self, col: usize) -> Result<Option<Side>, LoadError> {
        let raw = self.cell(col);
        match raw {
            "Bull" => Ok(Some(Side::Bull)),
            "Bear" => Ok(Some(Side::Bear)),
            _ if is_missing(raw) => Ok(None),
            _ => Err(LoadError::InvalidSide {
                column: self.header[col].clone(),
                row: self.row,
                value: raw.to_string(),
            }),
        }
    }

    pub fn position(&self, col: usize) -> Result<Position, LoadError> {
        let raw = self.cell(col);
        match raw {
            "Bull" => Ok(Position::Bull),
            "Bear" => Ok(Position::Bear),
            "House" => Ok(Position::House),
            _ if is_missing(raw) => Ok(Position::Unresolved),
            _ => Err(LoadError::InvalidPosition {
                row: self.row,
                value: raw.to_string(),
            }),
        }
    }

    pub fn round(&self, cols: &RoundColumns, decimals: u32) -> Result<Round, LoadError> {
        let epoch = self.int(cols.epoch)?;
        let amount = |col: usize| -> Result<f64, LoadError> {
            self.amount(col, decimals)?
                .ok_or_else(|| self.invalid_number(col))
        };

        Ok(Round {
            epoch: u64::try_from(epoch).map_err(|_| self.invalid_number(cols.epoch))?,
            start_timestamp: self.int(cols.start_timestamp)?,
            lock_timestamp: self.int(cols.lock_timestamp)?,
            close_timestamp: self.int(cols.close_timestamp)?,
            lock_price: self.int(cols.lock_price)?,
            close_price: self.int(cols.close_price)?,
            total_amount: amount(cols.total_amount)?,
            bull_amount: amount(cols.bull_amount)?,
            bear_amount: amount(cols.bear_amount)?,
            position: self.position(cols.position)?,
        })
    }
}

fn is_missing(raw: &str) -> bool {
    raw.is_empty() || raw.eq_ignore_ascii_case("nan")
}
