use serde::{Deserialize, Serialize};
use shard_framework::mock::MockRepository;
use shard_framework::{
    Effect, EntityActor, EntityKey, Envelope, FrameworkError, InMemoryRepository,
    LeastShardAllocationStrategy, RegionSettings, Repository, RepositoryError, RoutingError,
    ShardId, ShardRegion, ShardedEntity, Termination, WorkerId,
};
use std::sync::Arc;
use std::time::Duration;

// --- Test Entity ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
struct CounterId(u32);

impl std::fmt::Display for CounterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "counter_{}", self.0)
    }
}

impl EntityKey for CounterId {
    fn stable_hash(&self) -> i32 {
        self.0 as i32
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Counter {
    id: CounterId,
    value: u64,
}

#[derive(Debug, Serialize, Deserialize)]
enum CounterCommand {
    Add(u64),
    Get,
}

#[derive(Debug, thiserror::Error)]
enum CounterError {
    #[error("counter {0} was never written")]
    Missing(CounterId),
    #[error(transparent)]
    Framework(#[from] FrameworkError),
}

impl ShardedEntity for Counter {
    type Id = CounterId;
    type Command = CounterCommand;
    type Reply = u64;
    type Error = CounterError;

    fn id(&self) -> &CounterId {
        &self.id
    }

    fn handle(id: &CounterId, state: Option<&Self>, command: CounterCommand) -> Effect<Self> {
        match command {
            CounterCommand::Add(n) => {
                let value = state.map_or(0, |c| c.value) + n;
                Effect::persist(Counter { id: *id, value }, |c| c.value)
            }
            CounterCommand::Get => match state {
                Some(counter) => Effect::reply(counter.value),
                None => Effect::reject(CounterError::Missing(*id)),
            },
        }
    }
}

fn counter(id: u32, value: u64) -> Counter {
    Counter {
        id: CounterId(id),
        value,
    }
}

fn settings() -> RegionSettings {
    RegionSettings {
        max_shards: 12,
        workers: 2,
        mailbox_size: 16,
        ask_timeout: Duration::from_secs(2),
    }
}

// --- Entity Runtime ---

#[tokio::test]
async fn test_loads_once_then_serves_from_memory() {
    let mock = Arc::new(MockRepository::<Counter>::new());
    mock.expect_find().return_ok(Some(counter(1, 5)));
    mock.expect_update().return_ok();

    let (actor, entity) = EntityActor::<Counter>::new(CounterId(1), mock.clone(), 8);
    tokio::spawn(actor.run());

    assert_eq!(entity.ask(CounterCommand::Get).await.unwrap(), 5);
    assert_eq!(entity.ask(CounterCommand::Add(2)).await.unwrap(), 7);
    assert_eq!(entity.ask(CounterCommand::Get).await.unwrap(), 7);

    assert_eq!(mock.finds(), vec![CounterId(1)]);
    assert_eq!(mock.updates(), vec![counter(1, 7)]);
    mock.verify();
}

#[tokio::test]
async fn test_read_of_absent_entity_issues_no_write() {
    let mock = Arc::new(MockRepository::<Counter>::new());
    mock.expect_find().return_ok(None);

    let (actor, entity) = EntityActor::<Counter>::new(CounterId(3), mock.clone(), 8);
    tokio::spawn(actor.run());

    let result = entity.ask(CounterCommand::Get).await;
    assert!(matches!(result, Err(CounterError::Missing(CounterId(3)))));
    assert!(mock.updates().is_empty());
    mock.verify();
}

#[tokio::test]
async fn test_commands_during_slow_write_are_serialized() {
    let mock = Arc::new(MockRepository::<Counter>::new());
    mock.expect_find()
        .delay(Duration::from_millis(20))
        .return_ok(None);
    for _ in 0..5 {
        mock.expect_update()
            .delay(Duration::from_millis(20))
            .return_ok();
    }

    let (actor, entity) = EntityActor::<Counter>::new(CounterId(1), mock.clone(), 8);
    tokio::spawn(actor.run());

    // All five are enqueued before the load completes.
    let mut pending = Vec::new();
    for _ in 0..5 {
        pending.push(entity.deliver(CounterCommand::Add(1)).await.unwrap());
    }

    let mut replies = Vec::new();
    for reply in pending {
        replies.push(reply.await.unwrap().unwrap());
    }

    assert_eq!(replies, vec![1, 2, 3, 4, 5]);
    assert_eq!(mock.max_concurrent_updates(), 1);
    let written: Vec<u64> = mock.updates().iter().map(|c| c.value).collect();
    assert_eq!(written, vec![1, 2, 3, 4, 5]);
    mock.verify();
}

#[tokio::test]
async fn test_update_failure_fails_backlog_and_terminates() {
    let cause = RepositoryError::Unavailable("disk full".to_string());
    let mock = Arc::new(MockRepository::<Counter>::new());
    mock.expect_find().return_ok(Some(counter(1, 10)));
    mock.expect_update()
        .delay(Duration::from_millis(30))
        .return_err(cause.clone());

    let (actor, entity) = EntityActor::<Counter>::new(CounterId(1), mock.clone(), 8);
    let handle = tokio::spawn(actor.run());

    let first = entity.deliver(CounterCommand::Add(1)).await.unwrap();
    let second = entity.deliver(CounterCommand::Add(1)).await.unwrap();
    let third = entity.deliver(CounterCommand::Get).await.unwrap();

    for reply in [first, second, third] {
        match reply.await.unwrap() {
            Err(CounterError::Framework(FrameworkError::Persistence(e))) => assert_eq!(e, cause),
            other => panic!("expected persistence failure, got {:?}", other),
        }
    }

    assert_eq!(handle.await.unwrap(), Termination::UpdateFailed(cause));
    assert!(entity.is_closed());
    assert_eq!(mock.updates().len(), 1);
    mock.verify();
}

#[tokio::test]
async fn test_load_failure_drops_waiting_callers() {
    let cause = RepositoryError::Unavailable("timeout".to_string());
    let mock = Arc::new(MockRepository::<Counter>::new());
    mock.expect_find()
        .delay(Duration::from_millis(20))
        .return_err(cause.clone());

    let (actor, entity) = EntityActor::<Counter>::new(CounterId(1), mock.clone(), 8);
    let handle = tokio::spawn(actor.run());

    let pending = entity.deliver(CounterCommand::Get).await.unwrap();
    assert!(pending.await.is_err());
    assert_eq!(handle.await.unwrap(), Termination::LoadFailed(cause));
    assert!(mock.updates().is_empty());
}

#[tokio::test]
async fn test_passivation_drains_buffered_commands() {
    let repository = Arc::new(InMemoryRepository::<Counter>::with_latency(
        Duration::from_millis(10),
    ));
    let (actor, entity) = EntityActor::<Counter>::new(CounterId(4), repository.clone(), 8);
    let handle = tokio::spawn(actor.run());

    let first = entity.deliver(CounterCommand::Add(1)).await.unwrap();
    let second = entity.deliver(CounterCommand::Add(2)).await.unwrap();
    entity.passivate().await;

    assert_eq!(first.await.unwrap().unwrap(), 1);
    assert_eq!(second.await.unwrap().unwrap(), 3);
    assert_eq!(handle.await.unwrap(), Termination::Stopped);
    assert!(entity.is_closed());

    let late = entity.ask(CounterCommand::Get).await;
    assert!(matches!(
        late,
        Err(CounterError::Framework(FrameworkError::ActorClosed))
    ));
    assert_eq!(
        repository.find(&CounterId(4)).await.unwrap(),
        Some(counter(4, 3))
    );
}

// --- Shard Region ---

#[tokio::test]
async fn test_region_restarts_entity_after_write_failure() {
    let mock = Arc::new(MockRepository::<Counter>::new());
    mock.expect_find().return_ok(None);
    mock.expect_update()
        .return_err(RepositoryError::Unavailable("flaky".to_string()));
    mock.expect_find().return_ok(Some(counter(2, 10)));
    mock.expect_update().return_ok();

    let region = ShardRegion::<Counter>::new(mock.clone(), settings()).unwrap();

    let failed = region
        .ask(Envelope::new(CounterId(2), CounterCommand::Add(1)))
        .await;
    assert!(matches!(
        failed,
        Err(CounterError::Framework(FrameworkError::Persistence(_)))
    ));

    let reloaded = region
        .ask(Envelope::new(CounterId(2), CounterCommand::Add(1)))
        .await
        .unwrap();
    assert_eq!(reloaded, 11);
    assert_eq!(mock.finds(), vec![CounterId(2), CounterId(2)]);
    mock.verify();
}

#[tokio::test]
async fn test_region_passivate_then_reload() {
    let repository = Arc::new(InMemoryRepository::<Counter>::new());
    let region = ShardRegion::<Counter>::new(repository.clone(), settings()).unwrap();

    region
        .ask(Envelope::new(CounterId(5), CounterCommand::Add(3)))
        .await
        .unwrap();
    assert_eq!(region.resident_entities(), vec![CounterId(5)]);

    assert!(region.passivate(&CounterId(5)).await);
    assert!(region.resident_entities().is_empty());
    assert!(!region.passivate(&CounterId(5)).await);

    let value = region
        .ask(Envelope::new(CounterId(5), CounterCommand::Get))
        .await
        .unwrap();
    assert_eq!(value, 3);
}

#[tokio::test]
async fn test_region_ask_times_out() {
    let mock = Arc::new(MockRepository::<Counter>::new());
    mock.expect_find()
        .delay(Duration::from_millis(500))
        .return_ok(None);
    let region = ShardRegion::<Counter>::new(
        mock.clone(),
        RegionSettings {
            ask_timeout: Duration::from_millis(50),
            ..settings()
        },
    )
    .unwrap();

    let result = region
        .ask(Envelope::new(CounterId(1), CounterCommand::Get))
        .await;
    assert!(matches!(
        result,
        Err(CounterError::Framework(FrameworkError::Timeout(t))) if t == Duration::from_millis(50)
    ));
}

#[tokio::test]
async fn test_region_routes_raw_envelopes() {
    let repository = Arc::new(InMemoryRepository::<Counter>::new());
    let region = ShardRegion::<Counter>::new(repository, settings()).unwrap();

    let value = region
        .route_raw(br#"{"entityId":9,"command":{"Add":4}}"#)
        .await
        .unwrap();
    assert_eq!(value, 4);

    let rejected = region.route_raw(br#"{"orderId":9}"#).await;
    assert!(matches!(
        rejected,
        Err(CounterError::Framework(FrameworkError::Routing(
            RoutingError::NotAnEnvelope
        )))
    ));
}

#[tokio::test]
async fn test_region_handoff_keeps_state() {
    let repository = Arc::new(InMemoryRepository::<Counter>::new());
    let region = ShardRegion::<Counter>::new(repository, settings()).unwrap();

    // stable_hash 7 -> shard 7, round robin over two workers -> worker 1
    let id = CounterId(7);
    assert_eq!(region.shard_of(&id), ShardId(7));
    assert_eq!(region.shard_owner(ShardId(7)), Some(WorkerId(1)));

    region
        .ask(Envelope::new(id, CounterCommand::Add(6)))
        .await
        .unwrap();

    let stopped = region.handoff_shard(ShardId(7), WorkerId(0)).await;
    assert_eq!(stopped, 1);
    assert_eq!(region.shard_owner(ShardId(7)), Some(WorkerId(0)));
    assert!(region.resident_entities().is_empty());

    let value = region
        .ask(Envelope::new(id, CounterCommand::Get))
        .await
        .unwrap();
    assert_eq!(value, 6);
}

#[tokio::test]
async fn test_region_rebalances_onto_new_worker() {
    let repository = Arc::new(InMemoryRepository::<Counter>::new());
    let region = ShardRegion::<Counter>::new(repository, settings()).unwrap();
    for n in 0..12 {
        region
            .ask(Envelope::new(CounterId(n), CounterCommand::Add(1)))
            .await
            .unwrap();
    }

    region.add_worker(WorkerId(2));
    let moves = region
        .rebalance(&LeastShardAllocationStrategy::new(2, 10))
        .await;

    assert_eq!(moves.len(), 4);
    let counts: Vec<usize> = region.shard_counts().into_values().collect();
    assert_eq!(counts, vec![4, 4, 4]);
    assert_eq!(region.resident_entities().len(), 8);

    for n in 0..12 {
        let value = region
            .ask(Envelope::new(CounterId(n), CounterCommand::Get))
            .await
            .unwrap();
        assert_eq!(value, 1);
    }
}

#[tokio::test]
async fn test_region_shutdown_passivates_everything() {
    let repository = Arc::new(InMemoryRepository::<Counter>::new());
    let region = ShardRegion::<Counter>::new(repository.clone(), settings()).unwrap();
    for n in 0..3 {
        region
            .ask(Envelope::new(CounterId(n), CounterCommand::Add(n as u64)))
            .await
            .unwrap();
    }

    region.shutdown().await;
    assert!(region.resident_entities().is_empty());
    assert_eq!(region.registered_entities(), 0);
    assert_eq!(repository.len(), 3);
}

/// A command routed while the region is shutting down must not reach a second writer.
#[tokio::test]
async fn test_command_during_shutdown_is_not_lost() {
    let repository = Arc::new(InMemoryRepository::<Counter>::with_latency(
        Duration::from_millis(30),
    ));
    let region = ShardRegion::<Counter>::new(repository.clone(), settings()).unwrap();
    let id = CounterId(1);

    region
        .ask(Envelope::new(id, CounterCommand::Add(1)))
        .await
        .unwrap();

    let resident = region.entity_for(&id);
    let mut queued = Vec::new();
    for _ in 0..3 {
        queued.push(resident.deliver(CounterCommand::Add(10)).await.unwrap());
    }

    let stopping = tokio::spawn({
        let region = region.clone();
        async move { region.shutdown().await }
    });
    tokio::time::sleep(Duration::from_millis(5)).await;
    let late = region
        .ask(Envelope::new(id, CounterCommand::Add(100)))
        .await
        .unwrap();

    let mut replies = Vec::new();
    for reply in queued {
        replies.push(reply.await.unwrap().unwrap());
    }
    stopping.await.unwrap();

    assert_eq!(replies, vec![11, 21, 31]);
    assert_eq!(late, 131);
    assert_eq!(repository.find(&id).await.unwrap(), Some(counter(1, 131)));
}

#[tokio::test]
async fn test_failed_runtime_leaves_registry() {
    let mock = Arc::new(MockRepository::<Counter>::new());
    mock.expect_find().return_ok(None);
    mock.expect_update()
        .return_err(RepositoryError::Unavailable("disk full".to_string()));

    let region = ShardRegion::<Counter>::new(mock.clone(), settings()).unwrap();
    let failed = region
        .ask(Envelope::new(CounterId(3), CounterCommand::Add(1)))
        .await;
    assert!(matches!(
        failed,
        Err(CounterError::Framework(FrameworkError::Persistence(_)))
    ));

    // The entry is removed by the runtime's own task once it has stopped.
    for _ in 0..50 {
        if region.registered_entities() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(region.registered_entities(), 0);
    assert!(region.resident_entities().is_empty());
    mock.verify();
}
