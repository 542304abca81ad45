//! Shared fixtures for integration tests.

use std::time::Duration;

use chrono::NaiveDate;
use signalscript::adapters::memory_cache_adapter::MemoryCacheAdapter;
use signalscript::domain::artifact::Artifact;
use signalscript::domain::cache::ArtifactCache;
use signalscript::domain::compiler;
use signalscript::domain::series::{OhlcvBar, OhlcvSeries};

pub fn bars_from_closes(closes: &[f64]) -> OhlcvSeries {
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .checked_add_days(chrono::Days::new(i as u64))
                .unwrap(),
            open: close,
            high: close + 1.0,
            low: (close - 1.0).max(0.0),
            close,
            volume: 1_000 + i as i64,
        })
        .collect();
    OhlcvSeries::new(bars)
}

pub fn compile_artifact(source: &str) -> Artifact {
    compiler::compile(source)
        .artifact
        .expect("valid program")
}

pub fn memory_cache() -> ArtifactCache {
    ArtifactCache::new(
        Box::new(MemoryCacheAdapter::new(64, Duration::from_secs(3_600))),
        None,
    )
}
