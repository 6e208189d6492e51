//! # Shard Framework
//!
//! This crate provides the building blocks for hosting many long-lived, independently
//! addressable business entities in one process. It implements the **entity-actor
//! sharding** pattern on top of Tokio: every live entity identity gets exactly one
//! sequential runtime, identities are grouped into a fixed number of shards, and shards are
//! allocated over a pool of workers that can be rebalanced.
//!
//! ## Why Entity Actors?
//!
//! - **Single writer**: each identity is handled by one task at a time, so the in-memory
//!   snapshot needs no lock and writes for one entity are never concurrent.
//! - **Cache by construction**: the snapshot is read from the store once, on hydration, and
//!   every later command is answered from memory.
//! - **Location transparency**: callers address an entity by id. Where it runs is the
//!   router's concern.
//!
//! **Further Reading**:
//! - [Actors in Rust](https://ryhl.io/blog/actors-with-tokio/) - Practical guide to implementing actors with Tokio
//! - [Cluster Sharding](https://doc.akka.io/docs/akka/current/typed/cluster-sharding.html) - The pattern this crate follows
//!
//! ## Architecture Overview
//!
//! 1. **Entity Layer** ([`ShardedEntity`]) - Your snapshot type and its command decisions
//! 2. **Runtime Layer** ([`EntityActor`]) - Hydration, stashing, the single in-flight write
//! 3. **Routing Layer** ([`ShardRouter`], [`ShardRegion`]) - Identity to shard, lazy spawn, timeouts
//! 4. **Placement Layer** ([`ShardAllocation`], [`LeastShardAllocationStrategy`]) - Shard to worker
//! 5. **Persistence Layer** ([`Repository`]) - Async find/update by identity
//!
//! You write the decision logic **once** in [`ShardedEntity::handle`]; the runtime handles
//! every suspension point around the store.
//!
//! ## Runtime States
//!
//! | Phase | Mailbox | Store |
//! |-------|---------|-------|
//! | `Loading` | stashed | `find` in flight |
//! | `Ready` | processed in order | idle |
//! | `Busy` | stashed | one `update` in flight |
//!
//! Stashed messages are replayed in arrival order as soon as the runtime is `Ready` again.
//!
//! ## Concurrency Model
//!
//! - Each entity runtime runs in its own Tokio task
//! - Commands for one identity are handled **sequentially** (at most one write in flight)
//! - Different identities progress **in parallel**
//! - A replacement runtime waits on the previous one's [`IdentityLease`] before loading
//!
//! ## Testing
//!
//! The framework provides a **MockRepository** that implements [`Repository`] from scripted
//! expectations. It makes slow, failing and absent stores easy to reproduce and records every
//! write the runtime issued. See the [`mock`] module for the full API and usage patterns.

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;
pub mod rebalance;
pub mod region;
pub mod repository;
pub mod router;
pub mod tracing;

// Re-export core types for convenience
pub use actor::{EntityActor, IdentityLease, Phase, Termination};
pub use client::{EntityRef, PendingReply};
pub use client_trait::RegionClient;
pub use entity::{Effect, ShardedEntity};
pub use error::{FrameworkError, RepositoryError, RoutingError};
pub use message::{CommandResponse, EntityRequest, Response};
pub use rebalance::{LeastShardAllocationStrategy, ShardAllocation, ShardMove, WorkerId};
pub use region::{RegionSettings, ShardRegion};
pub use repository::{InMemoryRepository, Repository};
pub use router::{shard_of, EntityKey, Envelope, ShardId, ShardRouter};
