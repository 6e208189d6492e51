//! # Repository Gateway
//!
//! Asynchronous key/value persistence for entity snapshots. The runtime reads once at
//! hydration time and writes once per state-changing command; between those points the
//! in-memory snapshot is the source of truth.
//!
//! ## Contract
//!
//! - `find` reports absence as `Ok(None)`, never as an error.
//! - `update` replaces any record stored under the snapshot's id and returns the durable
//!   version, which the runtime adopts as its new state.
//! - `update` is all-or-nothing: when it returns `Err`, the previously stored snapshot is
//!   untouched.
//! - Implementations must provide per-key atomicity. Runtimes for different entities call
//!   the repository concurrently.
//! - Failures are returned as-is; retrying is not the repository's job.

use crate::entity::ShardedEntity;
use crate::error::RepositoryError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait Repository<T: ShardedEntity>: Send + Sync + 'static {
    async fn find(&self, id: &T::Id) -> Result<Option<T>, RepositoryError>;

    async fn update(&self, snapshot: T) -> Result<T, RepositoryError>;
}

/// Reference repository backed by a locked `HashMap`.
///
/// An optional artificial latency is applied before every call, which is how demos and
/// tests make the asynchronous boundary observable.
#[derive(Debug)]
pub struct InMemoryRepository<T: ShardedEntity> {
    records: RwLock<HashMap<T::Id, T>>,
    latency: Duration,
}

impl<T: ShardedEntity> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ShardedEntity> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            latency,
        }
    }

    /// Seeds the store directly, bypassing any runtime.
    pub fn insert(&self, snapshot: T) -> Result<(), RepositoryError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records.insert(snapshot.id().clone(), snapshot);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn poisoned() -> RepositoryError {
    RepositoryError::Unavailable("record lock poisoned".to_string())
}

#[async_trait]
impl<T: ShardedEntity> Repository<T> for InMemoryRepository<T> {
    async fn find(&self, id: &T::Id) -> Result<Option<T>, RepositoryError> {
        self.simulate_latency().await;
        let records = self.records.read().map_err(|_| poisoned())?;
        let found = records.get(id).cloned();
        debug!(%id, found = found.is_some(), "find");
        Ok(found)
    }

    async fn update(&self, snapshot: T) -> Result<T, RepositoryError> {
        self.simulate_latency().await;
        let mut records = self.records.write().map_err(|_| poisoned())?;
        debug!(id = %snapshot.id(), "update");
        records.insert(snapshot.id().clone(), snapshot.clone());
        Ok(snapshot)
    }
}
