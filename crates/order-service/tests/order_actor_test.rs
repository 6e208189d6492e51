use order_service::clients::OrderClient;
use order_service::model::{Order, OrderId, OrderItem, Server, Table};
use order_service::order_actor::{self, OpenOrder, OrderCommand, OrderError, OrderReply};
use shard_framework::mock::MockRepository;
use shard_framework::{FrameworkError, RegionSettings, RepositoryError, ShardRegion};
use std::sync::Arc;
use std::time::Duration;

fn open_cmd() -> OpenOrder {
    OpenOrder {
        server: Server::new("Alice"),
        table: Table::new(12),
    }
}

fn region_over(mock: &Arc<MockRepository<Order>>, ask_timeout: Duration) -> ShardRegion<Order> {
    ShardRegion::<Order>::new(
        mock.clone(),
        RegionSettings {
            ask_timeout,
            ..RegionSettings::default()
        },
    )
    .unwrap()
}

/// Real Order runtime with a scripted store.
/// Open on an order that is already in the store is rejected without a write.
#[tokio::test]
async fn test_duplicate_open_issues_no_write() {
    let id = OrderId::new();
    let existing = Order::open(id, Server::new("Bob"), Table::new(3));

    let mock = Arc::new(MockRepository::<Order>::new());
    mock.expect_find().return_ok(Some(existing.clone()));

    let (actor, order) = order_actor::new(id, mock.clone(), 8);
    tokio::spawn(actor.run());

    let result = order.ask(OrderCommand::Open(open_cmd())).await;
    assert_eq!(result, Err(OrderError::Duplicate(id)));

    // State is untouched
    let current = order.ask(OrderCommand::Get).await.unwrap();
    assert_eq!(current, OrderReply::Current(existing));

    assert!(mock.updates().is_empty());
    mock.verify();
}

#[tokio::test]
async fn test_not_found_for_absent_order() {
    let id = OrderId::new();
    let mock = Arc::new(MockRepository::<Order>::new());
    mock.expect_find().return_ok(None);

    let (actor, order) = order_actor::new(id, mock.clone(), 8);
    tokio::spawn(actor.run());

    let add = order
        .ask(OrderCommand::AddItem(order_actor::AddItemToOrder {
            item: OrderItem::new("Ribs", ""),
        }))
        .await;
    let get = order.ask(OrderCommand::Get).await;

    assert_eq!(add, Err(OrderError::NotFound(id)));
    assert_eq!(get, Err(OrderError::NotFound(id)));
    assert!(mock.updates().is_empty());
    mock.verify();
}

/// Two AddItem commands sent back to back while the store is slow: both succeed, in
/// arrival order, and the second write starts only after the first has finished.
#[tokio::test]
async fn test_back_to_back_items_with_slow_store() {
    let id = OrderId::new();
    let opened = Order::open(id, Server::new("Alice"), Table::new(12));

    let mock = Arc::new(MockRepository::<Order>::new());
    mock.expect_find().return_ok(Some(opened.clone()));
    mock.expect_update()
        .delay(Duration::from_millis(50))
        .return_ok();
    mock.expect_update()
        .delay(Duration::from_millis(50))
        .return_ok();

    let client = OrderClient::new(region_over(&mock, Duration::from_secs(2)));
    let ribs = OrderItem::new("Ribs", "extra sauce");
    let slaw = OrderItem::new("Coleslaw", "");

    let (first, second) = tokio::join!(
        client.add_item(id, ribs.clone()),
        client.add_item(id, slaw.clone())
    );
    let first = first.unwrap();
    let second = second.unwrap();

    assert_eq!(first.items, vec![ribs.clone()]);
    assert_eq!(second.items, vec![ribs, slaw]);
    assert_eq!(mock.max_concurrent_updates(), 1);
    mock.verify();
}

/// A failed write is reported to its caller; the next command reaches a fresh runtime
/// that reloads the last committed snapshot.
#[tokio::test]
async fn test_crash_and_reload_after_failed_write() {
    let id = OrderId::new();
    let committed = Order::open(id, Server::new("Alice"), Table::new(12));
    let cause = RepositoryError::Unavailable("connection reset".to_string());

    let mock = Arc::new(MockRepository::<Order>::new());
    mock.expect_find().return_ok(Some(committed.clone()));
    mock.expect_update().return_err(cause.clone());
    mock.expect_find().return_ok(Some(committed.clone()));

    let client = OrderClient::new(region_over(&mock, Duration::from_secs(2)));

    let failed = client.add_item(id, OrderItem::new("Ribs", "")).await;
    assert_eq!(
        failed,
        Err(OrderError::Internal(FrameworkError::Persistence(cause)))
    );

    let reloaded = client.find_order(id).await.unwrap();
    assert_eq!(reloaded, committed);
    assert_eq!(mock.finds(), vec![id, id]);
    mock.verify();
}

#[tokio::test]
async fn test_slow_load_times_out() {
    let id = OrderId::new();
    let mock = Arc::new(MockRepository::<Order>::new());
    mock.expect_find()
        .delay(Duration::from_millis(500))
        .return_ok(None);

    let client = OrderClient::new(region_over(&mock, Duration::from_millis(50)));
    let result = client.find_order(id).await;

    assert_eq!(
        result,
        Err(OrderError::Internal(FrameworkError::Timeout(
            Duration::from_millis(50)
        )))
    );
}
