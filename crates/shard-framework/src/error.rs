//! # Framework Errors
//!
//! This module defines the infrastructure-level errors shared by every sharded entity.
//! Business rejections (an order that does not exist, a duplicate open) belong to each
//! entity's own error type; that type must implement `From<FrameworkError>` so both kinds
//! travel back to the caller over the same reply channel.

use std::time::Duration;

/// Errors raised by the runtime itself rather than by entity logic.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameworkError {
    /// The entity's mailbox is closed; the instance has terminated or is passivating.
    #[error("Actor closed")]
    ActorClosed,
    /// The entity dropped the reply channel without answering (connection loss).
    #[error("Actor dropped response channel")]
    ActorDropped,
    /// The caller gave up waiting. In-flight work inside the entity is not cancelled.
    #[error("Ask timed out after {0:?}")]
    Timeout(Duration),
    /// The repository rejected a read or a write.
    #[error("Persistence failure: {0}")]
    Persistence(#[from] RepositoryError),
    #[error("Routing failure: {0}")]
    Routing(#[from] RoutingError),
}

/// Failures reported by a [`Repository`](crate::Repository) implementation.
///
/// Cloneable so a single failed write can be reported to every command buffered behind it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store rejected {id}: {reason}")]
    Rejected { id: String, reason: String },
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Failures of the shard router.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    /// The payload parsed but is not an `{entityId, command}` envelope.
    #[error("message is not a routable envelope")]
    NotAnEnvelope,
    /// The payload looked like an envelope but its identity or command did not decode.
    #[error("malformed envelope: {0}")]
    Malformed(String),
    #[error("shard count must be at least 1")]
    InvalidShardCount,
}
