//! Two-tier artifact cache.
//!
//! Lookups go memory tier first, then the optional shared tier, then the
//! compiler. A shared-tier hit is promoted into the memory tier; a fresh
//! compile is written to both. Shared-tier failures are absorbed and logged,
//! never surfaced: the cache degrades to compile-always rather than taking
//! the engine down with it.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::artifact::{Artifact, CacheKey};
use crate::domain::compiler::{self, ENGINE_COMPILER_VERSION};
use crate::domain::validator::ValidationReport;
use crate::ports::ArtifactStore;

/// Hit/miss/compile counters, cheap enough to keep always-on.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    compiles: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub compiles: u64,
}

impl CacheStats {
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            compiles: self.compiles.load(Ordering::Relaxed),
        }
    }
}

/// Outcome of one lookup-or-compile round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheOutcome {
    /// Absent when the program was rejected by validation.
    pub artifact: Option<Artifact>,
    /// Empty on a cache hit; rejected programs are never cached, so their
    /// report is recomputed on every attempt.
    pub report: ValidationReport,
    pub from_cache: bool,
}

pub struct ArtifactCache {
    memory: Box<dyn ArtifactStore + Send + Sync>,
    shared: Option<Box<dyn ArtifactStore + Send + Sync>>,
    compiler_version: String,
    stats: CacheStats,
}

impl ArtifactCache {
    pub fn new(
        memory: Box<dyn ArtifactStore + Send + Sync>,
        shared: Option<Box<dyn ArtifactStore + Send + Sync>>,
    ) -> Self {
        Self {
            memory,
            shared,
            compiler_version: ENGINE_COMPILER_VERSION.to_string(),
            stats: CacheStats::default(),
        }
    }

    /// Override the compiler version participating in keys and hashes.
    /// Version-bump invalidation tests use this; production callers never do.
    pub fn with_compiler_version(mut self, version: &str) -> Self {
        self.compiler_version = version.to_string();
        self
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    /// Look up the artifact for `source`, compiling on miss.
    pub fn get_or_compile(&self, source: &str) -> CacheOutcome {
        let key = CacheKey {
            hash: compiler::source_hash(source, &self.compiler_version),
            compiler_version: self.compiler_version.clone(),
        };

        if let Some(artifact) = self.lookup(&key) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key = %key.wire(), "artifact cache hit");
            return CacheOutcome {
                artifact: Some(artifact),
                report: ValidationReport::default(),
                from_cache: true,
            };
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(key = %key.wire(), "artifact cache miss");

        let out = compiler::compile_with_version(source, &self.compiler_version);
        self.stats.compiles.fetch_add(1, Ordering::Relaxed);

        if let Some(artifact) = &out.artifact {
            self.store(&key, artifact);
        }
        CacheOutcome {
            artifact: out.artifact,
            report: out.report,
            from_cache: false,
        }
    }

    /// Drop expired entries from every tier.
    pub fn purge_expired(&self) -> u64 {
        let mut dropped = self.memory.purge_expired().unwrap_or(0);
        if let Some(shared) = &self.shared {
            match shared.purge_expired() {
                Ok(n) => dropped += n,
                Err(err) => tracing::warn!(error = %err, "shared cache purge failed"),
            }
        }
        dropped
    }

    /// Drop everything from every tier.
    pub fn clear(&self) -> u64 {
        let mut dropped = self.memory.clear().unwrap_or(0);
        if let Some(shared) = &self.shared {
            match shared.clear() {
                Ok(n) => dropped += n,
                Err(err) => tracing::warn!(error = %err, "shared cache clear failed"),
            }
        }
        dropped
    }

    fn lookup(&self, key: &CacheKey) -> Option<Artifact> {
        match self.memory.get(key) {
            Ok(Some(artifact)) => return Some(artifact),
            Ok(None) => {}
            Err(err) => tracing::warn!(error = %err, "memory cache read failed"),
        }

        let shared = self.shared.as_ref()?;
        match shared.get(key) {
            Ok(Some(artifact)) => {
                // Promote so the next lookup stays in-process.
                if let Err(err) = self.memory.put(key, &artifact) {
                    tracing::warn!(error = %err, "memory cache promote failed");
                }
                Some(artifact)
            }
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(error = %err, "shared cache read failed");
                None
            }
        }
    }

    fn store(&self, key: &CacheKey, artifact: &Artifact) {
        if let Err(err) = self.memory.put(key, artifact) {
            tracing::warn!(error = %err, "memory cache write failed");
        }
        if let Some(shared) = &self.shared {
            if let Err(err) = shared.put(key, artifact) {
                tracing::warn!(error = %err, "shared cache write failed");
            }
        }
    }
}
