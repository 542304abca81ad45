use crate::domain::artifact::{Artifact, CacheKey};
use crate::domain::error::EngineError;

/// One tier of artifact storage.
///
/// Implementations own their TTL policy; expired entries must never be
/// returned from `get`. `put` is last-writer-wins: concurrent writers racing
/// on the same key store identical artifacts, so either write is correct.
pub trait ArtifactStore {
    fn get(&self, key: &CacheKey) -> Result<Option<Artifact>, EngineError>;

    fn put(&self, key: &CacheKey, artifact: &Artifact) -> Result<(), EngineError>;

    /// Remove expired entries, returning how many were dropped.
    fn purge_expired(&self) -> Result<u64, EngineError>;

    /// Remove everything, returning how many entries were dropped.
    fn clear(&self) -> Result<u64, EngineError>;
}
