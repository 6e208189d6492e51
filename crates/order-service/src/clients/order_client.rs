//! # Order Client
//!
//! The gateway adapter for the Order entity. Each call wraps a command in an envelope,
//! routes it through the [`ShardRegion`] and blocks on the single reply under the region's
//! ask timeout.
use crate::model::{Order, OrderId, OrderItem};
use crate::order_actor::{AddItemToOrder, OpenOrder, OrderCommand, OrderError};
use shard_framework::{RegionClient, ShardRegion};
use tracing::{debug, info, instrument};

/// Client for interacting with Order entities.
#[derive(Clone)]
pub struct OrderClient {
    region: ShardRegion<Order>,
}

impl OrderClient {
    pub fn new(region: ShardRegion<Order>) -> Self {
        Self { region }
    }

    /// Opens a new order under a freshly generated id.
    #[instrument(skip(self))]
    pub async fn open_order(&self, open: OpenOrder) -> Result<Order, OrderError> {
        self.open_order_with_id(OrderId::new(), open).await
    }

    /// Opens an order under a caller-chosen id. Re-sending after a timeout may surface
    /// `Duplicate` if the first attempt was applied.
    #[instrument(skip(self, open))]
    pub async fn open_order_with_id(
        &self,
        id: OrderId,
        open: OpenOrder,
    ) -> Result<Order, OrderError> {
        debug!(?open, "open_order called");
        let order = self.ask(id, OrderCommand::Open(open)).await?.into_order();
        info!(%id, table = order.table.number, "Order opened");
        Ok(order)
    }

    #[instrument(skip(self, item))]
    pub async fn add_item(&self, id: OrderId, item: OrderItem) -> Result<Order, OrderError> {
        debug!(?item, "add_item called");
        let reply = self
            .ask(id, OrderCommand::AddItem(AddItemToOrder { item }))
            .await?;
        Ok(reply.into_order())
    }

    #[instrument(skip(self))]
    pub async fn find_order(&self, id: OrderId) -> Result<Order, OrderError> {
        Ok(self.ask(id, OrderCommand::Get).await?.into_order())
    }
}

impl RegionClient<Order> for OrderClient {
    fn region(&self) -> &ShardRegion<Order> {
        &self.region
    }
}
