//! The [`OrderSystem`]: one repository, one region and one client, plus scale-out and
//! shutdown.

use crate::clients::OrderClient;
use crate::config::Settings;
use crate::model::Order;
use shard_framework::{
    InMemoryRepository, LeastShardAllocationStrategy, RoutingError, ShardMove, ShardRegion,
    WorkerId,
};
use std::sync::Arc;
use tracing::info;

/// The runtime orchestrator for the order service.
///
/// `OrderSystem` is responsible for:
/// - **Wiring**: one repository, one region, one client over both
/// - **Coordination**: exposing rebalancing to whoever decides when to rebalance
/// - **Shutdown**: passivating every resident order
///
/// # Example
///
/// ```ignore
/// let system = OrderSystem::new(&Settings::default())?;
///
/// let order = system.order_client.open_order(open).await?;
/// system.order_client.add_item(order.id, item).await?;
///
/// system.shutdown().await;
/// ```
pub struct OrderSystem {
    /// Gateway adapter for Order entities
    pub order_client: OrderClient,

    /// Registry and supervisor of every order runtime
    pub region: ShardRegion<Order>,

    /// Backing store shared by every runtime
    pub repository: Arc<InMemoryRepository<Order>>,
}

impl OrderSystem {
    /// Builds the repository, the region and the client. No runtime is spawned until the
    /// first command for an order arrives.
    pub fn new(settings: &Settings) -> Result<Self, RoutingError> {
        let repository = Arc::new(InMemoryRepository::<Order>::with_latency(
            settings.store_latency(),
        ));
        let region = ShardRegion::<Order>::new(repository.clone(), settings.region_settings())?;
        let order_client = OrderClient::new(region.clone());

        info!(
            max_shards = settings.max_shards,
            workers = settings.workers,
            "Order system ready"
        );
        Ok(Self {
            order_client,
            region,
            repository,
        })
    }

    /// Adds a worker and moves shards onto it.
    pub async fn scale_out(
        &self,
        worker: WorkerId,
        strategy: &LeastShardAllocationStrategy,
    ) -> Vec<ShardMove> {
        self.region.add_worker(worker);
        self.region.rebalance(strategy).await
    }

    /// Passivates every resident order and waits for all of them to stop.
    pub async fn shutdown(self) {
        info!("Shutting down system...");
        self.region.shutdown().await;
        info!(stored = self.repository.len(), "System shutdown complete.");
    }
}
