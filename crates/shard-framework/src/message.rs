//! # Entity Messages
//!
//! This module defines the mailbox message type exchanged between an
//! [`EntityRef`](crate::EntityRef) and its [`EntityActor`](crate::EntityActor).

use crate::entity::ShardedEntity;
use tokio::sync::oneshot;

/// Single-fulfillment reply channel: exactly one answer or a dropped sender, never both.
pub type Response<R, E> = oneshot::Sender<Result<R, E>>;

/// Reply channel for a command sent to entity `T`.
pub type CommandResponse<T> =
    Response<<T as ShardedEntity>::Reply, <T as ShardedEntity>::Error>;

/// Everything an entity runtime can find in its mailbox.
///
/// Commands carry no identity; the runtime already knows which entity it hosts.
#[derive(Debug)]
pub enum EntityRequest<T: ShardedEntity> {
    Command {
        command: T::Command,
        respond_to: CommandResponse<T>,
    },
    /// Stop accepting new work, drain what is buffered, then exit.
    /// The sender is notified once the runtime has stopped.
    Passivate { respond_to: oneshot::Sender<()> },
}
