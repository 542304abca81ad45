//! Per-execution binding table.
//!
//! A fresh [`Namespace`] is built for every run, so nothing an invocation
//! assigns can leak into the next one. The OHLCV columns and the caller's
//! scalar parameters are the only initial bindings.

use std::collections::HashMap;

use crate::domain::series::{OhlcvSeries, Value, OHLCV_COLUMNS};

#[derive(Debug, Default)]
pub struct Namespace {
    bindings: HashMap<String, Value>,
}

impl Namespace {
    /// Bindings for one run: the five bar columns plus scalar parameters.
    pub fn for_run(bars: &OhlcvSeries, params: &HashMap<String, f64>) -> Self {
        let mut bindings = HashMap::new();
        for column in OHLCV_COLUMNS {
            if let Some(series) = bars.column(column) {
                bindings.insert(column.to_string(), Value::Series(series));
            }
        }
        for (name, value) in params {
            bindings.insert(name.clone(), Value::Scalar(*value));
        }
        Self { bindings }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn bind(&mut self, name: String, value: Value) {
        self.bindings.insert(name, value);
    }

    /// Estimated heap footprint of all bindings, for memory accounting.
    pub fn total_bytes(&self) -> u64 {
        self.bindings.values().map(Value::byte_size).sum()
    }
}
