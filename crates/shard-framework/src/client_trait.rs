//! # RegionClient Trait
//!
//! Common surface for entity-specific gateway clients, providing `ask`, `passivate` and
//! `shard_of` on top of a [`ShardRegion`].
use crate::{Envelope, ShardId, ShardRegion, ShardedEntity};
use async_trait::async_trait;

/// Trait for typed gateway clients that front a [`ShardRegion`].
///
/// Implementors only expose the region; the envelope plumbing is provided. Domain clients
/// then add intention-revealing methods (`open_order`, `add_item`, ...) on top of `ask`.
///
/// # Example
///
/// ```rust
/// use shard_framework::{Effect, EntityKey, FrameworkError, InMemoryRepository, RegionClient,
///     RegionSettings, ShardRegion, ShardedEntity};
/// use std::sync::Arc;
///
/// #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
/// struct CounterId(u32);
/// impl std::fmt::Display for CounterId {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
/// }
/// impl EntityKey for CounterId {
///     fn stable_hash(&self) -> i32 { self.0 as i32 }
/// }
///
/// #[derive(Debug, Clone)]
/// struct Counter { id: CounterId, value: u64 }
///
/// #[derive(Debug, thiserror::Error)]
/// enum CounterError {
///     #[error(transparent)]
///     Framework(#[from] FrameworkError),
/// }
///
/// impl ShardedEntity for Counter {
///     type Id = CounterId;
///     type Command = ();
///     type Reply = u64;
///     type Error = CounterError;
///     fn id(&self) -> &CounterId { &self.id }
///     fn handle(id: &CounterId, state: Option<&Self>, _: ()) -> Effect<Self> {
///         let value = state.map_or(0, |c| c.value) + 1;
///         Effect::persist(Counter { id: id.clone(), value }, |c| c.value)
///     }
/// }
///
/// struct CounterClient { region: ShardRegion<Counter> }
///
/// impl RegionClient<Counter> for CounterClient {
///     fn region(&self) -> &ShardRegion<Counter> { &self.region }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let repository = Arc::new(InMemoryRepository::<Counter>::new());
///     let region = ShardRegion::<Counter>::new(repository, RegionSettings::default()).unwrap();
///     let client = CounterClient { region };
///
///     assert_eq!(client.ask(CounterId(7), ()).await.unwrap(), 1);
///     assert_eq!(client.ask(CounterId(7), ()).await.unwrap(), 2);
///     assert!(client.passivate(CounterId(7)).await);
/// }
/// ```
#[async_trait]
pub trait RegionClient<T: ShardedEntity>: Send + Sync {
    /// Access the region this client routes through.
    fn region(&self) -> &ShardRegion<T>;

    /// Wrap `command` in an envelope for `id` and wait for the reply.
    #[tracing::instrument(skip(self, command))]
    async fn ask(&self, id: T::Id, command: T::Command) -> Result<T::Reply, T::Error> {
        tracing::debug!(?command, "Sending command");
        self.region().ask(Envelope::new(id, command)).await
    }

    /// Gracefully stop the runtime for `id`, if one is resident.
    #[tracing::instrument(skip(self))]
    async fn passivate(&self, id: T::Id) -> bool {
        self.region().passivate(&id).await
    }

    fn shard_of(&self, id: &T::Id) -> ShardId {
        self.region().shard_of(id)
    }
}
