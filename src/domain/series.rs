//! Market data and runtime value types.
//!
//! A [`Series`] stores one `Option<f64>` per bar: `None` is the explicit
//! no-value marker used for warmup regions and anything derived from them.
//! The convention is uniform across the whole engine — undefined positions
//! are never silently zero-filled.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Bar table supplied by the caller; the five columns are bound into every
/// execution namespace as directly addressable names.
#[derive(Debug, Clone, Default)]
pub struct OhlcvSeries {
    pub bars: Vec<OhlcvBar>,
}

pub const OHLCV_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

impl OhlcvSeries {
    pub fn new(bars: Vec<OhlcvBar>) -> Self {
        Self { bars }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Extract a column as a fully-defined series.
    pub fn column(&self, name: &str) -> Option<Series> {
        let values: Vec<f64> = match name {
            "open" => self.bars.iter().map(|b| b.open).collect(),
            "high" => self.bars.iter().map(|b| b.high).collect(),
            "low" => self.bars.iter().map(|b| b.low).collect(),
            "close" => self.bars.iter().map(|b| b.close).collect(),
            "volume" => self.bars.iter().map(|b| b.volume as f64).collect(),
            _ => return None,
        };
        Some(Series::from_values(values))
    }
}

/// A per-bar numeric series with explicit undefined positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub points: Vec<Option<f64>>,
}

impl Series {
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            points: values.into_iter().map(Some).collect(),
        }
    }

    pub fn from_points(points: Vec<Option<f64>>) -> Self {
        Self { points }
    }

    pub fn undefined(len: usize) -> Self {
        Self {
            points: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.points.get(index).copied().flatten()
    }

    /// Number of leading undefined positions.
    pub fn warmup_len(&self) -> usize {
        self.points.iter().take_while(|p| p.is_none()).count()
    }

    /// Estimated heap footprint, used for memory accounting.
    pub fn byte_size(&self) -> u64 {
        (self.points.len() * std::mem::size_of::<Option<f64>>()) as u64
    }

    /// Elementwise combination; undefined propagates.
    pub fn zip_with(&self, other: &Series, f: impl Fn(f64, f64) -> f64) -> Series {
        let points = self
            .points
            .iter()
            .zip(&other.points)
            .map(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => Some(f(*a, *b)),
                _ => None,
            })
            .collect();
        Series { points }
    }

    /// Elementwise map over defined positions.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Series {
        let points = self.points.iter().map(|p| p.map(&f)).collect();
        Series { points }
    }
}

/// A per-bar boolean series produced by comparisons and logical operators.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    pub points: Vec<Option<bool>>,
}

impl Mask {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn byte_size(&self) -> u64 {
        (self.points.len() * std::mem::size_of::<Option<bool>>()) as u64
    }
}

/// A runtime value inside one execution namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f64),
    Series(Series),
    Mask(Mask),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Series(_) => "series",
            Value::Mask(_) => "mask",
        }
    }

    pub fn byte_size(&self) -> u64 {
        match self {
            Value::Scalar(_) => 0,
            Value::Series(s) => s.byte_size(),
            Value::Mask(m) => m.byte_size(),
        }
    }
}
