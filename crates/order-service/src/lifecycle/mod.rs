//! # System Lifecycle
//!
//! Wiring and teardown of the order service.
//!
//! ## The OrderSystem Pattern
//!
//! Entity runtimes are never started here; the region spawns them on first use. What the
//! [`OrderSystem`] owns is everything they share:
//!
//! ```rust,ignore
//! impl OrderSystem {
//!     pub fn new(settings: &Settings) -> Result<Self, RoutingError> {
//!         // 1. The store every runtime hydrates from and writes to
//!         let repository = Arc::new(InMemoryRepository::with_latency(settings.store_latency()));
//!
//!         // 2. The region: router, registry and shard allocation
//!         let region = ShardRegion::new(repository.clone(), settings.region_settings())?;
//!
//!         // 3. The gateway adapter in front of it
//!         let order_client = OrderClient::new(region.clone());
//!         Ok(Self { order_client, region, repository })
//!     }
//! }
//! ```
//!
//! ## Graceful Shutdown
//!
//! 1. **Stop accepting requests** - the HTTP server finishes in-flight requests first
//! 2. **Passivate every resident order** - each runtime finishes its in-flight write and
//!    answers everything buffered behind it
//! 3. **Drop the region** - nothing is left to reconstruct except the store
//!
//! No snapshot is lost: every acknowledged command has already been persisted.

pub mod order_system;

pub use order_system::*;
