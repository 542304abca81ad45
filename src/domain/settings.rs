//! Engine settings assembled from a [`ConfigPort`].
//!
//! Every key has a default; the only hard requirement is a path when the
//! sqlite cache backend is selected.

use std::time::Duration;

use crate::domain::error::EngineError;
use crate::domain::limiter::ResourceLimit;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheBackend {
    Memory,
    Sqlite { path: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub backend: CacheBackend,
    pub memory_capacity: usize,
    pub memory_ttl: Duration,
    pub shared_ttl_seconds: i64,
    pub pool_size: u32,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            memory_capacity: 256,
            memory_ttl: Duration::from_secs(3_600),
            shared_ttl_seconds: 86_400,
            pool_size: 4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineSettings {
    pub cache: CacheSettings,
    pub limits: ResourceLimit,
}

fn positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, EngineError> {
    let value = config.get_int(section, key, default);
    if value < 1 {
        return Err(EngineError::ConfigInvalid {
            section: section.into(),
            key: key.into(),
            reason: format!("must be positive, got {value}"),
        });
    }
    Ok(value)
}

impl EngineSettings {
    pub fn from_port(config: &dyn ConfigPort) -> Result<Self, EngineError> {
        let defaults = CacheSettings::default();
        let limit_defaults = ResourceLimit::default();

        let backend = match config
            .get_string("cache", "backend")
            .unwrap_or_else(|| "memory".into())
            .as_str()
        {
            "memory" => CacheBackend::Memory,
            "sqlite" => {
                let path = config.get_string("cache", "path").ok_or_else(|| {
                    EngineError::ConfigMissing {
                        section: "cache".into(),
                        key: "path".into(),
                    }
                })?;
                CacheBackend::Sqlite { path }
            }
            other => {
                return Err(EngineError::ConfigInvalid {
                    section: "cache".into(),
                    key: "backend".into(),
                    reason: format!("unknown backend '{other}'"),
                });
            }
        };

        let cache = CacheSettings {
            backend,
            memory_capacity: positive_int(
                config,
                "cache",
                "memory_capacity",
                defaults.memory_capacity as i64,
            )? as usize,
            memory_ttl: Duration::from_secs(positive_int(
                config,
                "cache",
                "memory_ttl_seconds",
                defaults.memory_ttl.as_secs() as i64,
            )? as u64),
            shared_ttl_seconds: positive_int(
                config,
                "cache",
                "shared_ttl_seconds",
                defaults.shared_ttl_seconds,
            )?,
            pool_size: positive_int(config, "cache", "pool_size", defaults.pool_size as i64)?
                as u32,
        };

        let limits = ResourceLimit {
            max_duration_ms: positive_int(
                config,
                "limits",
                "max_duration_ms",
                limit_defaults.max_duration_ms as i64,
            )? as u64,
            max_memory_bytes: positive_int(
                config,
                "limits",
                "max_memory_bytes",
                limit_defaults.max_memory_bytes as i64,
            )? as u64,
            max_output_len: positive_int(
                config,
                "limits",
                "max_output_len",
                limit_defaults.max_output_len as i64,
            )? as usize,
        };

        Ok(Self { cache, limits })
    }
}
