//! # ShardedEntity Trait
//!
//! The `ShardedEntity` trait is the contract a snapshot type implements to be hosted by an
//! [`EntityActor`](crate::EntityActor). The entity supplies the *decision* (what a command
//! means given the current in-memory snapshot); the runtime supplies the *plumbing*
//! (hydration, buffering, the single in-flight write, replies).
//!
//! Decisions are pure and synchronous. Anything that touches the store is expressed as an
//! [`Effect::Persist`] and carried out by the runtime, which is what lets the runtime
//! guarantee at most one write per entity at a time.

use crate::error::FrameworkError;
use crate::router::EntityKey;
use std::fmt::Debug;

/// Trait that every snapshot type must implement to be managed by an `EntityActor`.
///
/// # Associated Types
/// - `Id`: routing and persistence key.
/// - `Command`: closed set of operations, matched exhaustively in [`ShardedEntity::handle`].
/// - `Reply`: success payloads sent back to the caller.
/// - `Error`: business rejections. Must absorb [`FrameworkError`] so a persistence
///   failure or a timeout reaches the caller as the same type.
pub trait ShardedEntity: Clone + Debug + Send + Sync + 'static {
    type Id: EntityKey;
    type Command: Send + Debug + 'static;
    type Reply: Send + Debug + 'static;
    type Error: std::error::Error + From<FrameworkError> + Send + Sync + 'static;

    /// The identity this snapshot is stored under.
    fn id(&self) -> &Self::Id;

    /// Decide what a command does. `state` is `None` when the store had no record.
    fn handle(id: &Self::Id, state: Option<&Self>, command: Self::Command) -> Effect<Self>;
}

/// The outcome of [`ShardedEntity::handle`].
pub enum Effect<T: ShardedEntity> {
    /// Answer from memory without touching the store.
    Reply(Result<T::Reply, T::Error>),
    /// Write `snapshot`; on success adopt the stored value and answer with `reply(stored)`.
    Persist {
        snapshot: T,
        reply: fn(T) -> T::Reply,
    },
}

impl<T: ShardedEntity> Effect<T> {
    pub fn reply(reply: T::Reply) -> Self {
        Effect::Reply(Ok(reply))
    }

    pub fn reject(error: T::Error) -> Self {
        Effect::Reply(Err(error))
    }

    pub fn persist(snapshot: T, reply: fn(T) -> T::Reply) -> Self {
        Effect::Persist { snapshot, reply }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, Effect::Persist { .. })
    }
}

impl<T: ShardedEntity> Debug for Effect<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effect::Reply(result) => f.debug_tuple("Reply").field(result).finish(),
            Effect::Persist { snapshot, .. } => {
                f.debug_struct("Persist").field("snapshot", snapshot).finish()
            }
        }
    }
}
