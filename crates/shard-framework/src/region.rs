//! # Shard Region
//!
//! The registry and supervisor for every entity runtime hosted by this process.
//!
//! A region routes each envelope through the [`ShardRouter`], finds the runtime for the
//! identity (spawning one on first use), and waits for the reply under the ask timeout.
//! Runtimes are never restarted eagerly: a runtime that terminates removes its own registry
//! entry, and the next message routed to its identity spawns a fresh one.
//!
//! Replacements share an [`IdentityLease`] with the instance they replace and do not start
//! loading until that instance has fully stopped, so an identity never has two writers.

use crate::actor::{EntityActor, IdentityLease};
use crate::client::EntityRef;
use crate::entity::ShardedEntity;
use crate::error::{FrameworkError, RoutingError};
use crate::rebalance::{LeastShardAllocationStrategy, ShardAllocation, ShardMove, WorkerId};
use crate::repository::Repository;
use crate::router::{Envelope, ShardId, ShardRouter};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// A closed mailbox found while delivering is retried once against a fresh runtime.
const DELIVERY_ATTEMPTS: usize = 2;

/// Tunables for a region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSettings {
    /// Number of shards. Must match every other process routing to the same entities.
    pub max_shards: u32,
    /// Size of the worker pool shards are allocated over.
    pub workers: u32,
    /// Mailbox capacity per entity runtime.
    pub mailbox_size: usize,
    /// How long `ask` waits for a reply.
    pub ask_timeout: Duration,
}

impl Default for RegionSettings {
    fn default() -> Self {
        Self {
            max_shards: 30,
            workers: 3,
            mailbox_size: 32,
            ask_timeout: Duration::from_secs(5),
        }
    }
}

struct Resident<T: ShardedEntity> {
    entity: EntityRef<T>,
    lease: IdentityLease,
    generation: u64,
}

struct RegionState<T: ShardedEntity> {
    shards: HashMap<ShardId, HashMap<T::Id, Resident<T>>>,
    allocation: ShardAllocation,
    next_generation: u64,
}

struct RegionInner<T: ShardedEntity> {
    router: ShardRouter,
    repository: Arc<dyn Repository<T>>,
    settings: RegionSettings,
    state: Mutex<RegionState<T>>,
}

/// Cloneable handle to a region. Clones share the same registry.
pub struct ShardRegion<T: ShardedEntity> {
    inner: Arc<RegionInner<T>>,
}

impl<T: ShardedEntity> Clone for ShardRegion<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: ShardedEntity> ShardRegion<T> {
    pub fn new(
        repository: Arc<dyn Repository<T>>,
        settings: RegionSettings,
    ) -> Result<Self, RoutingError> {
        let router = ShardRouter::new(settings.max_shards)?;
        let allocation = ShardAllocation::round_robin(settings.max_shards, settings.workers);
        Ok(Self {
            inner: Arc::new(RegionInner {
                router,
                repository,
                settings,
                state: Mutex::new(RegionState {
                    shards: HashMap::new(),
                    allocation,
                    next_generation: 0,
                }),
            }),
        })
    }

    pub fn router(&self) -> ShardRouter {
        self.inner.router
    }

    pub fn settings(&self) -> &RegionSettings {
        &self.inner.settings
    }

    pub fn shard_of(&self, id: &T::Id) -> ShardId {
        self.inner.router.shard_of(id)
    }

    pub fn shard_owner(&self, shard: ShardId) -> Option<WorkerId> {
        self.lock().allocation.owner_of(shard)
    }

    /// Shards owned per worker.
    pub fn shard_counts(&self) -> BTreeMap<WorkerId, usize> {
        self.lock().allocation.counts()
    }

    pub fn add_worker(&self, worker: WorkerId) {
        info!(%worker, "Worker joined");
        self.lock().allocation.add_worker(worker);
    }

    /// Identities with a live runtime (mailbox still open).
    pub fn resident_entities(&self) -> Vec<T::Id> {
        self.lock()
            .shards
            .values()
            .flat_map(|residents| residents.values())
            .filter(|resident| !resident.entity.is_closed())
            .map(|resident| resident.entity.id().clone())
            .collect()
    }

    /// Registry entries, including runtimes that have stopped but are not yet removed.
    pub fn registered_entities(&self) -> usize {
        self.lock().shards.values().map(HashMap::len).sum()
    }

    /// Routes a command to its entity and waits for the reply.
    ///
    /// On timeout the wait is abandoned; the command may still be applied by the entity.
    pub async fn ask(&self, envelope: Envelope<T::Id, T::Command>) -> Result<T::Reply, T::Error> {
        let timeout = self.inner.settings.ask_timeout;
        let id = envelope.entity_id.clone();
        match tokio::time::timeout(timeout, self.deliver(envelope)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(%id, ?timeout, "Ask timed out");
                Err(T::Error::from(FrameworkError::Timeout(timeout)))
            }
        }
    }

    /// Decodes a JSON envelope and routes it like [`ShardRegion::ask`].
    pub async fn route_raw(&self, raw: &[u8]) -> Result<T::Reply, T::Error>
    where
        T::Command: DeserializeOwned,
    {
        let (shard, envelope) = self
            .inner
            .router
            .decode::<T::Id, T::Command>(raw)
            .map_err(|e| T::Error::from(FrameworkError::Routing(e)))?;
        debug!(id = %envelope.entity_id, %shard, "Decoded envelope");
        self.ask(envelope).await
    }

    /// The runtime for `id`, spawned if it is not resident or has terminated.
    pub fn entity_for(&self, id: &T::Id) -> EntityRef<T> {
        let shard = self.shard_of(id);
        self.resolve(shard, id)
    }

    /// Gracefully stops the runtime for `id`. Returns `false` if none was resident.
    pub async fn passivate(&self, id: &T::Id) -> bool {
        let shard = self.shard_of(id);
        let resident = {
            let state = self.lock();
            state
                .shards
                .get(&shard)
                .and_then(|residents| residents.get(id))
                .map(|resident| (resident.entity.clone(), resident.generation))
        };
        let Some((entity, generation)) = resident else {
            return false;
        };
        entity.passivate().await;
        self.forget(shard, id, generation);
        info!(%id, %shard, "Passivated");
        true
    }

    /// Passivates every runtime in `shard`, then reassigns the shard to `to`.
    ///
    /// Returns how many runtimes were stopped. Messages routed to the shard meanwhile are
    /// served by replacement runtimes that wait for the old ones to finish.
    pub async fn handoff_shard(&self, shard: ShardId, to: WorkerId) -> usize {
        let (from, residents) = {
            let state = self.lock();
            let residents: Vec<(ShardId, EntityRef<T>, u64)> = state
                .shards
                .get(&shard)
                .map(|residents| {
                    residents
                        .values()
                        .map(|r| (shard, r.entity.clone(), r.generation))
                        .collect()
                })
                .unwrap_or_default();
            (state.allocation.owner_of(shard), residents)
        };
        info!(%shard, ?from, %to, entities = residents.len(), "Handing off shard");

        let stopped = self.stop_all(&residents).await;
        self.lock().allocation.assign(shard, to);
        stopped
    }

    /// Plans moves with `strategy` and applies each one with [`ShardRegion::handoff_shard`].
    pub async fn rebalance(&self, strategy: &LeastShardAllocationStrategy) -> Vec<ShardMove> {
        let moves = {
            let state = self.lock();
            strategy.plan(&state.allocation)
        };
        for shard_move in &moves {
            self.handoff_shard(shard_move.shard, shard_move.to).await;
        }
        if !moves.is_empty() {
            info!(moves = moves.len(), "Rebalanced");
        }
        moves
    }

    /// Passivates every resident runtime and removes it from the registry.
    ///
    /// Entries stay registered until their runtime has stopped, so a message routed during
    /// shutdown either joins the draining backlog or waits on the identity lease.
    pub async fn shutdown(&self) {
        let residents: Vec<(ShardId, EntityRef<T>, u64)> = {
            let state = self.lock();
            state
                .shards
                .iter()
                .flat_map(|(shard, residents)| {
                    residents
                        .values()
                        .map(move |r| (*shard, r.entity.clone(), r.generation))
                })
                .collect()
        };
        info!(entities = residents.len(), "Shutting down region");
        self.stop_all(&residents).await;
    }

    async fn deliver(&self, envelope: Envelope<T::Id, T::Command>) -> Result<T::Reply, T::Error> {
        let shard = self.inner.router.shard_for(&envelope);
        let (id, mut command) = envelope.into_parts();
        for _ in 0..DELIVERY_ATTEMPTS {
            let entity = self.resolve(shard, &id);
            match entity.deliver(command).await {
                Ok(pending) => {
                    return pending
                        .await
                        .map_err(|_| T::Error::from(FrameworkError::ActorDropped))?;
                }
                Err(returned) => command = returned,
            }
        }
        Err(T::Error::from(FrameworkError::ActorClosed))
    }

    fn resolve(&self, shard: ShardId, id: &T::Id) -> EntityRef<T> {
        let mut state = self.lock();
        let owner = state.allocation.owner_of(shard);
        let residents = state.shards.entry(shard).or_default();

        let previous = residents.get(id);
        if let Some(resident) = previous {
            if !resident.entity.is_closed() {
                return resident.entity.clone();
            }
        }
        let restarted = previous.is_some();
        let lease: IdentityLease = previous
            .map(|resident| Arc::clone(&resident.lease))
            .unwrap_or_default();

        let (actor, entity) = EntityActor::new(
            id.clone(),
            Arc::clone(&self.inner.repository),
            self.inner.settings.mailbox_size,
        );
        let generation = state.next_generation;
        state.next_generation += 1;

        // Holds no sender, so dropping every region handle still stops the runtime.
        let region = Arc::downgrade(&self.inner);
        let runtime = actor.with_lease(Arc::clone(&lease)).run();
        let owned_id = id.clone();
        tokio::spawn(async move {
            let termination = runtime.await;
            if let Some(inner) = Weak::upgrade(&region) {
                ShardRegion { inner }.forget(shard, &owned_id, generation);
            }
            termination
        });
        debug!(%id, %shard, ?owner, restarted, generation, "Spawned entity");

        state.shards.entry(shard).or_default().insert(
            id.clone(),
            Resident {
                entity: entity.clone(),
                lease,
                generation,
            },
        );
        entity
    }

    /// Drops the registry entry for `id` unless it already belongs to a newer instance.
    fn forget(&self, shard: ShardId, id: &T::Id, generation: u64) {
        let mut state = self.lock();
        let now_empty = match state.shards.get_mut(&shard) {
            Some(residents) => {
                let same = residents
                    .get(id)
                    .is_some_and(|resident| resident.generation == generation);
                if same {
                    residents.remove(id);
                }
                residents.is_empty()
            }
            None => false,
        };
        if now_empty {
            state.shards.remove(&shard);
        }
    }

    /// Passivates `residents` in parallel, then forgets each one. Returns how many stopped.
    async fn stop_all(&self, residents: &[(ShardId, EntityRef<T>, u64)]) -> usize {
        let mut stopping = JoinSet::new();
        for (_, entity, _) in residents {
            let entity = entity.clone();
            stopping.spawn(async move { entity.passivate().await });
        }
        let mut stopped = 0;
        while stopping.join_next().await.is_some() {
            stopped += 1;
        }
        for (shard, entity, generation) in residents {
            self.forget(*shard, entity.id(), *generation);
        }
        stopped
    }

    fn lock(&self) -> MutexGuard<'_, RegionState<T>> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
