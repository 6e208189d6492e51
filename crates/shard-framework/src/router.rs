//! # Shard Router
//!
//! Maps an entity identity to a shard number without any global knowledge of where
//! entities live. The mapping is a pure function of the identity's canonical bytes, so two
//! processes configured with the same `max_shards` agree on placement without talking to
//! each other, and a process restart never moves an entity.
//!
//! ```rust
//! use shard_framework::{EntityKey, ShardId, ShardRouter};
//!
//! #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
//! struct TableId(u32);
//!
//! impl std::fmt::Display for TableId {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "table_{}", self.0) }
//! }
//!
//! impl EntityKey for TableId {
//!     fn stable_hash(&self) -> i32 { self.0 as i32 }
//! }
//!
//! let router = ShardRouter::new(10).unwrap();
//! assert_eq!(router.shard_of(&TableId(42)), ShardId(2));
//! ```

use crate::error::RoutingError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Identity of a sharded entity: persistence key and routing key at once.
///
/// `stable_hash` must be computed from the identity's canonical byte form. It must never
/// depend on memory addresses or per-process hasher seeds (`std::collections::hash_map::DefaultHasher`
/// is randomly keyed and therefore not acceptable here).
pub trait EntityKey:
    Eq + Hash + Clone + Send + Sync + Display + Debug + Serialize + DeserializeOwned + 'static
{
    fn stable_hash(&self) -> i32;
}

/// A routing bucket. Many entities map to one shard; one worker owns a shard at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShardId(pub u32);

impl Display for ShardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "shard_{}", self.0)
    }
}

/// `abs(hash(id)) mod shard_count`.
///
/// Computed in 64-bit space so `i32::MIN` hashes and shard counts above `i32::MAX` are safe.
pub fn shard_of<K: EntityKey>(id: &K, shard_count: u32) -> Result<ShardId, RoutingError> {
    if shard_count == 0 {
        return Err(RoutingError::InvalidShardCount);
    }
    Ok(bucket(id.stable_hash(), shard_count))
}

fn bucket(hash: i32, shard_count: u32) -> ShardId {
    let shard = (i64::from(hash) % i64::from(shard_count)).unsigned_abs();
    ShardId(shard as u32)
}

/// The only message type the router inspects: an identity paired with a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<K, C> {
    pub entity_id: K,
    pub command: C,
}

impl<K, C> Envelope<K, C> {
    pub fn new(entity_id: K, command: C) -> Self {
        Self { entity_id, command }
    }

    pub fn into_parts(self) -> (K, C) {
        (self.entity_id, self.command)
    }
}

/// Deterministic router configured with the cluster-wide `max_shards`.
///
/// Changing `max_shards` reassigns nearly every entity; do it only through a coordinated
/// rebalance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardRouter {
    max_shards: u32,
}

impl ShardRouter {
    pub fn new(max_shards: u32) -> Result<Self, RoutingError> {
        if max_shards == 0 {
            return Err(RoutingError::InvalidShardCount);
        }
        Ok(Self { max_shards })
    }

    pub fn max_shards(&self) -> u32 {
        self.max_shards
    }

    /// Shard for an identity. Also answers "where should this unrouted identity land"
    /// when a coordinator warms up a shard.
    pub fn shard_of<K: EntityKey>(&self, id: &K) -> ShardId {
        bucket(id.stable_hash(), self.max_shards)
    }

    pub fn shard_for<K: EntityKey, C>(&self, envelope: &Envelope<K, C>) -> ShardId {
        self.shard_of(&envelope.entity_id)
    }

    pub fn extract_identity<'a, K, C>(&self, envelope: &'a Envelope<K, C>) -> &'a K {
        &envelope.entity_id
    }

    pub fn extract_command<K, C>(&self, envelope: Envelope<K, C>) -> C {
        envelope.command
    }

    /// Decodes a JSON envelope arriving from outside the process.
    ///
    /// Anything that is not an object carrying both `entityId` and `command` is
    /// [`RoutingError::NotAnEnvelope`]; an envelope whose fields fail to decode is
    /// [`RoutingError::Malformed`].
    pub fn decode<K, C>(&self, raw: &[u8]) -> Result<(ShardId, Envelope<K, C>), RoutingError>
    where
        K: EntityKey,
        C: DeserializeOwned,
    {
        let value: serde_json::Value =
            serde_json::from_slice(raw).map_err(|e| RoutingError::Malformed(e.to_string()))?;
        let is_envelope = value
            .as_object()
            .map(|fields| fields.contains_key("entityId") && fields.contains_key("command"))
            .unwrap_or(false);
        if !is_envelope {
            return Err(RoutingError::NotAnEnvelope);
        }
        let envelope: Envelope<K, C> =
            serde_json::from_value(value).map_err(|e| RoutingError::Malformed(e.to_string()))?;
        let shard = self.shard_for(&envelope);
        Ok((shard, envelope))
    }
}
