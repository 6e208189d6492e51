//! # Order Actor
//!
//! The Order entity: what each command means for one order, given the snapshot its runtime
//! holds in memory.
//!
//! ## Structure
//!
//! - [`commands`] - [`OrderCommand`] and [`OrderReply`], the wire types carried in envelopes
//! - [`entity`] - [`ShardedEntity`](shard_framework::ShardedEntity) implementation for [`Order`](crate::model::Order)
//! - [`error`] - [`OrderError`] type for type-safe error handling
//!
//! ## Command Semantics
//!
//! | Command | No snapshot | Snapshot present |
//! |---------|-------------|------------------|
//! | `Open` | persist new order, `Opened` | `Duplicate`, no write |
//! | `AddItem` | `NotFound`, no write | persist copy with item, `ItemAdded` |
//! | `Get` | `NotFound` | `Current`, no write |
//!
//! ## Usage
//!
//! ```rust
//! use order_service::model::{Order, OrderId, Server, Table};
//! use order_service::order_actor::{self, OpenOrder, OrderCommand, OrderReply};
//! use shard_framework::InMemoryRepository;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let repository = Arc::new(InMemoryRepository::<Order>::new());
//!     let id = OrderId::new();
//!     let (actor, order) = order_actor::new(id, repository, 32);
//!     tokio::spawn(actor.run());
//!
//!     let open = OpenOrder { server: Server::new("Alice"), table: Table::new(4) };
//!     let reply = order.ask(OrderCommand::Open(open)).await.unwrap();
//!     assert!(matches!(reply, OrderReply::Opened(_)));
//! }
//! ```

pub mod commands;
pub mod entity;
pub mod error;

pub use commands::*;
pub use error::*;

use crate::model::{Order, OrderId};
use shard_framework::{EntityActor, EntityRef, Repository};
use std::sync::Arc;

/// Creates a standalone Order runtime and its handle, outside any region.
pub fn new(
    id: OrderId,
    repository: Arc<dyn Repository<Order>>,
    mailbox_size: usize,
) -> (EntityActor<Order>, EntityRef<Order>) {
    EntityActor::new(id, repository, mailbox_size)
}
