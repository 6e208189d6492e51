//! Commands and replies for the Order entity.
//!
//! Commands carry no identity; the envelope they travel in does. The payload structs double
//! as HTTP request bodies.

use crate::model::{Order, OrderItem, Server, Table};
use serde::{Deserialize, Serialize};

/// Body of `Open`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub server: Server,
    pub table: Table,
}

/// Body of `AddItem`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddItemToOrder {
    pub item: OrderItem,
}

/// Everything an Order runtime can be asked to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCommand {
    Open(OpenOrder),
    AddItem(AddItemToOrder),
    Get,
}

/// Successful outcomes. Every variant carries the snapshot after the command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderReply {
    Opened(Order),
    ItemAdded(Order),
    /// Answer to `Get`; served from memory.
    Current(Order),
}

impl OrderReply {
    pub fn order(&self) -> &Order {
        match self {
            OrderReply::Opened(order) | OrderReply::ItemAdded(order) | OrderReply::Current(order) => {
                order
            }
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            OrderReply::Opened(order) | OrderReply::ItemAdded(order) | OrderReply::Current(order) => {
                order
            }
        }
    }
}
