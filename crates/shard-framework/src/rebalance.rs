//! # Shard Allocation & Rebalancing
//!
//! Which worker hosts which shard. The allocation is the only placement state in the
//! system; entity placement follows from it through the [`ShardRouter`](crate::ShardRouter).
//!
//! Deciding *when* to rebalance is left to the caller. [`LeastShardAllocationStrategy`]
//! only decides *what* to move.

use crate::router::ShardId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// A member of the worker pool. Shards are owned by exactly one worker at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerId(pub u32);

impl Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "worker_{}", self.0)
    }
}

/// A single shard relocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardMove {
    pub shard: ShardId,
    pub from: WorkerId,
    pub to: WorkerId,
}

/// Shard → worker ownership table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardAllocation {
    owners: BTreeMap<ShardId, WorkerId>,
    workers: Vec<WorkerId>,
}

impl ShardAllocation {
    /// Round-robin allocation: shard `s` starts on worker `s mod workers`.
    pub fn round_robin(max_shards: u32, workers: u32) -> Self {
        let workers: Vec<WorkerId> = (0..workers.max(1)).map(WorkerId).collect();
        let owners = (0..max_shards)
            .map(|shard| (ShardId(shard), workers[shard as usize % workers.len()]))
            .collect();
        Self { owners, workers }
    }

    pub fn owner_of(&self, shard: ShardId) -> Option<WorkerId> {
        self.owners.get(&shard).copied()
    }

    pub fn workers(&self) -> &[WorkerId] {
        &self.workers
    }

    /// Joins a new, empty worker. A no-op if it is already a member.
    pub fn add_worker(&mut self, worker: WorkerId) {
        if !self.workers.contains(&worker) {
            self.workers.push(worker);
            self.workers.sort();
        }
    }

    pub fn assign(&mut self, shard: ShardId, worker: WorkerId) {
        self.add_worker(worker);
        self.owners.insert(shard, worker);
    }

    pub fn shards_of(&self, worker: WorkerId) -> Vec<ShardId> {
        self.owners
            .iter()
            .filter(|(_, owner)| **owner == worker)
            .map(|(shard, _)| *shard)
            .collect()
    }

    /// Shards per worker, including workers that own nothing.
    pub fn counts(&self) -> BTreeMap<WorkerId, usize> {
        let mut counts: BTreeMap<WorkerId, usize> =
            self.workers.iter().map(|worker| (*worker, 0)).collect();
        for owner in self.owners.values() {
            *counts.entry(*owner).or_insert(0) += 1;
        }
        counts
    }
}

/// Moves shards from the most loaded worker to the least loaded one.
///
/// A move is proposed only while the difference between them is at least
/// `rebalance_threshold` (and never below 2, where a move would just swap the imbalance).
/// At most `max_simultaneous` moves are proposed per round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeastShardAllocationStrategy {
    pub rebalance_threshold: usize,
    pub max_simultaneous: usize,
}

impl Default for LeastShardAllocationStrategy {
    fn default() -> Self {
        Self {
            rebalance_threshold: 1,
            max_simultaneous: 3,
        }
    }
}

impl LeastShardAllocationStrategy {
    pub fn new(rebalance_threshold: usize, max_simultaneous: usize) -> Self {
        Self {
            rebalance_threshold,
            max_simultaneous,
        }
    }

    pub fn plan(&self, allocation: &ShardAllocation) -> Vec<ShardMove> {
        let threshold = self.rebalance_threshold.max(2);
        let mut simulated = allocation.clone();
        let mut moves = Vec::new();

        while moves.len() < self.max_simultaneous {
            let counts = simulated.counts();
            // Ties resolve to the lowest worker id on both ends.
            let Some((&most, &most_count)) = counts
                .iter()
                .max_by(|(wa, ca), (wb, cb)| ca.cmp(cb).then(wb.cmp(wa)))
            else {
                break;
            };
            let Some((&least, &least_count)) = counts.iter().min_by_key(|(_, count)| **count)
            else {
                break;
            };
            if most_count - least_count < threshold {
                break;
            }
            let Some(shard) = simulated.shards_of(most).into_iter().next_back() else {
                break;
            };
            simulated.assign(shard, least);
            moves.push(ShardMove {
                shard,
                from: most,
                to: least,
            });
        }
        moves
    }
}
