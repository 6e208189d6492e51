//! Entity trait implementation for the Order domain type.
//!
//! This module contains the [`ShardedEntity`] trait implementation that enables [`Order`]
//! to be hosted by the generic [`EntityActor`](shard_framework::EntityActor).

use crate::model::{Order, OrderId};
use crate::order_actor::{OrderCommand, OrderError, OrderReply};
use shard_framework::{Effect, ShardedEntity};

impl ShardedEntity for Order {
    type Id = OrderId;
    type Command = OrderCommand;
    type Reply = OrderReply;
    type Error = OrderError;

    fn id(&self) -> &OrderId {
        &self.id
    }

    fn handle(id: &OrderId, state: Option<&Self>, command: OrderCommand) -> Effect<Self> {
        match (command, state) {
            (OrderCommand::Open(open), None) => {
                Effect::persist(Order::open(*id, open.server, open.table), OrderReply::Opened)
            }
            (OrderCommand::Open(_), Some(_)) => Effect::reject(OrderError::Duplicate(*id)),
            (OrderCommand::AddItem(add), Some(order)) => {
                Effect::persist(order.with_item(add.item), OrderReply::ItemAdded)
            }
            (OrderCommand::AddItem(_), None) | (OrderCommand::Get, None) => {
                Effect::reject(OrderError::NotFound(*id))
            }
            (OrderCommand::Get, Some(order)) => Effect::reply(OrderReply::Current(order.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OrderItem, Server, Table};
    use crate::order_actor::{AddItemToOrder, OpenOrder};

    fn open() -> OrderCommand {
        OrderCommand::Open(OpenOrder {
            server: Server::new("Alice"),
            table: Table::new(7),
        })
    }

    #[test]
    fn test_open_absent_order_persists() {
        let id = OrderId::new();
        let effect = Order::handle(&id, None, open());
        match effect {
            Effect::Persist { snapshot, reply } => {
                assert_eq!(snapshot, Order::open(id, Server::new("Alice"), Table::new(7)));
                assert_eq!(reply(snapshot.clone()), OrderReply::Opened(snapshot));
            }
            other => panic!("expected a write, got {:?}", other),
        }
    }

    #[test]
    fn test_open_existing_order_is_duplicate() {
        let id = OrderId::new();
        let existing = Order::open(id, Server::new("Bob"), Table::new(1));
        let effect = Order::handle(&id, Some(&existing), open());
        assert!(!effect.is_write());
        assert!(matches!(effect, Effect::Reply(Err(OrderError::Duplicate(d))) if d == id));
    }

    #[test]
    fn test_add_item_without_order_is_not_found() {
        let id = OrderId::new();
        let add = OrderCommand::AddItem(AddItemToOrder {
            item: OrderItem::new("Ribs", ""),
        });
        let effect = Order::handle(&id, None, add);
        assert!(matches!(effect, Effect::Reply(Err(OrderError::NotFound(n))) if n == id));
    }

    #[test]
    fn test_get_is_a_pure_read() {
        let id = OrderId::new();
        let existing = Order::open(id, Server::new("Bob"), Table::new(1));
        let effect = Order::handle(&id, Some(&existing), OrderCommand::Get);
        assert!(!effect.is_write());
        assert!(matches!(effect, Effect::Reply(Ok(OrderReply::Current(o))) if o == existing));
    }
}
