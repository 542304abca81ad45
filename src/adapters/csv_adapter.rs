//! CSV bar source.
//!
//! Expects a header row of `date,open,high,low,close,volume` with ISO dates.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::error::EngineError;
use crate::domain::series::{OhlcvBar, OhlcvSeries};
use crate::ports::data_port::BarSource;

pub struct CsvBarAdapter {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
}

impl CsvBarAdapter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl BarSource for CsvBarAdapter {
    fn load(&self) -> Result<OhlcvSeries, EngineError> {
        let mut reader =
            csv::Reader::from_path(&self.path).map_err(|e| EngineError::BarData {
                reason: format!("{}: {e}", self.path.display()),
            })?;

        let mut bars = Vec::new();
        for (i, record) in reader.deserialize::<CsvRow>().enumerate() {
            let row = record.map_err(|e| EngineError::BarData {
                reason: format!("row {}: {e}", i + 1),
            })?;
            let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").map_err(|e| {
                EngineError::BarData {
                    reason: format!("row {}: bad date '{}': {e}", i + 1, row.date),
                }
            })?;
            bars.push(OhlcvBar {
                date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }

        if bars.is_empty() {
            return Err(EngineError::BarData {
                reason: format!("{}: no bars", self.path.display()),
            });
        }
        Ok(OhlcvSeries::new(bars))
    }
}
