//! In-process artifact cache tier: bounded LRU with per-entry TTL.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::domain::artifact::{Artifact, CacheKey};
use crate::domain::error::EngineError;
use crate::ports::cache_port::ArtifactStore;

struct CacheItem {
    artifact: Artifact,
    inserted_at: Instant,
}

#[derive(Default)]
struct Tier {
    entries: HashMap<String, CacheItem>,
    /// Least recently used at the front.
    order: VecDeque<String>,
}

pub struct MemoryCacheAdapter {
    inner: Mutex<Tier>,
    capacity: usize,
    ttl: Duration,
}

impl MemoryCacheAdapter {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Tier::default()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache mutex poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn touch(tier: &mut Tier, wire: &str) {
        if let Some(pos) = tier.order.iter().position(|k| k == wire) {
            tier.order.remove(pos);
        }
        tier.order.push_back(wire.to_string());
    }
}

impl ArtifactStore for MemoryCacheAdapter {
    fn get(&self, key: &CacheKey) -> Result<Option<Artifact>, EngineError> {
        let wire = key.wire();
        let mut tier = self.inner.lock().expect("cache mutex poisoned");

        let expired = match tier.entries.get(&wire) {
            None => return Ok(None),
            Some(item) => item.inserted_at.elapsed() > self.ttl,
        };
        if expired {
            tier.entries.remove(&wire);
            tier.order.retain(|k| k != &wire);
            return Ok(None);
        }

        Self::touch(&mut tier, &wire);
        Ok(tier.entries.get(&wire).map(|item| item.artifact.clone()))
    }

    fn put(&self, key: &CacheKey, artifact: &Artifact) -> Result<(), EngineError> {
        let wire = key.wire();
        let mut tier = self.inner.lock().expect("cache mutex poisoned");

        tier.entries.insert(
            wire.clone(),
            CacheItem {
                artifact: artifact.clone(),
                inserted_at: Instant::now(),
            },
        );
        Self::touch(&mut tier, &wire);

        while tier.entries.len() > self.capacity {
            let Some(evicted) = tier.order.pop_front() else {
                break;
            };
            tier.entries.remove(&evicted);
        }
        Ok(())
    }

    fn purge_expired(&self) -> Result<u64, EngineError> {
        let mut tier = self.inner.lock().expect("cache mutex poisoned");
        let ttl = self.ttl;
        let before = tier.entries.len();
        tier.entries.retain(|_, item| item.inserted_at.elapsed() <= ttl);
        let dropped = before - tier.entries.len();
        let Tier { entries, order } = &mut *tier;
        order.retain(|k| entries.contains_key(k));
        Ok(dropped as u64)
    }

    fn clear(&self) -> Result<u64, EngineError> {
        let mut tier = self.inner.lock().expect("cache mutex poisoned");
        let dropped = tier.entries.len() as u64;
        tier.entries.clear();
        tier.order.clear();
        Ok(dropped)
    }
}
