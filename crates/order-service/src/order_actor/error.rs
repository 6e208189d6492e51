//! Error types for the Order actor.

use crate::model::OrderId;
use shard_framework::FrameworkError;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    /// No order has been opened under this id.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// `Open` on an order that already exists.
    #[error("Order already exists: {0}")]
    Duplicate(OrderId),

    /// Timeout, store failure, lost runtime or routing failure.
    #[error(transparent)]
    Internal(#[from] FrameworkError),
}

impl OrderError {
    /// The order this error is about, when it names one.
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            OrderError::NotFound(id) | OrderError::Duplicate(id) => Some(*id),
            OrderError::Internal(_) => None,
        }
    }
}
