//! Represents a table's open order.
//!
//! # Shard Framework
//! [`Order`] is the snapshot type of the Order entity. See
//! [`impl ShardedEntity for Order`](crate::order_actor::entity) for the command handling.
//!
//! Snapshots are immutable values: [`Order::with_item`] returns a new snapshot and leaves
//! the original untouched.

use serde::{Deserialize, Serialize};
use shard_framework::EntityKey;
use std::fmt::Display;
use uuid::Uuid;

/// Type-safe identifier for Orders.
///
/// Serialized as `{"value": "<uuid>"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId {
    value: Uuid,
}

impl OrderId {
    /// A fresh random (v4) identifier.
    pub fn new() -> Self {
        Self {
            value: Uuid::new_v4(),
        }
    }

    pub fn from_uuid(value: Uuid) -> Self {
        Self { value }
    }

    /// Parses the hyphenated form used in URL path segments.
    pub fn parse(raw: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(raw).map(Self::from_uuid)
    }

    pub fn value(&self) -> Uuid {
        self.value
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl EntityKey for OrderId {
    /// Content hash over the two 64-bit halves of the UUID, folded to 32 bits and seeded
    /// with 31. Other nodes already route with this exact function.
    fn stable_hash(&self) -> i32 {
        let bits = self.value.as_u128();
        let hilo = ((bits >> 64) as i64) ^ (bits as i64);
        let folded = ((hilo >> 32) as i32) ^ (hilo as i32);
        31i32.wrapping_add(folded)
    }
}

/// The server who opened the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub name: String,
}

impl Server {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub number: i32,
}

impl Table {
    pub fn new(number: i32) -> Self {
        Self { number }
    }
}

/// A line item. Instructions are free text and may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub name: String,
    pub special_instructions: String,
}

impl OrderItem {
    pub fn new(name: impl Into<String>, special_instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            special_instructions: special_instructions.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub server: Server,
    pub table: Table,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// A freshly opened order with no items.
    pub fn open(id: OrderId, server: Server, table: Table) -> Self {
        Self {
            id,
            server,
            table,
            items: Vec::new(),
        }
    }

    /// Copy of this order with `item` appended.
    pub fn with_item(&self, item: OrderItem) -> Self {
        let mut items = self.items.clone();
        items.push(item);
        Self {
            id: self.id,
            server: self.server.clone(),
            table: self.table,
            items,
        }
    }
}
