//! # Mock Repository & Testing Guide
//!
//! `MockRepository<T>` implements the same [`Repository<T>`] trait as the production store but
//! answers from a queue of scripted expectations. It lets you make the store slow, absent or
//! failing on demand, and then check exactly which writes the runtime issued.
//!
//! ## When to use the Mock vs the In-Memory Store
//!
//! | Feature | MockRepository | InMemoryRepository |
//! |---------|----------------|--------------------|
//! | **State** | None (scripted answers) | Real records |
//! | **Call order** | Enforced, panics on mismatch | Not checked |
//! | **Error Injection** | Easy (`return_err`) | Not possible |
//! | **Latency** | Per call (`delay`) | One global value |
//! | **Use Case** | Runtime behaviour around the store | Full system flows |
//!
//! ## Testing Strategies
//!
//! <details>
//! <summary><b>Pattern 1: Single Runtime with a Scripted Store</b></summary>
//!
//! **When to use**: checking what an entity does for one identity, including which writes
//! it issues and how it reacts to store failures.
//!
//! ```rust
//! use shard_framework::mock::MockRepository;
//! use shard_framework::{Effect, EntityActor, EntityKey, FrameworkError, RepositoryError,
//!     ShardedEntity};
//! use std::sync::Arc;
//!
//! #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
//! struct NoteId(u32);
//! impl std::fmt::Display for NoteId {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
//! }
//! impl EntityKey for NoteId {
//!     fn stable_hash(&self) -> i32 { self.0 as i32 }
//! }
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Note { id: NoteId, text: String }
//!
//! #[derive(Debug, thiserror::Error)]
//! enum NoteError {
//!     #[error(transparent)]
//!     Framework(#[from] FrameworkError),
//! }
//!
//! impl ShardedEntity for Note {
//!     type Id = NoteId;
//!     type Command = String;
//!     type Reply = Note;
//!     type Error = NoteError;
//!     fn id(&self) -> &NoteId { &self.id }
//!     fn handle(id: &NoteId, _: Option<&Self>, text: String) -> Effect<Self> {
//!         Effect::persist(Note { id: id.clone(), text }, |note| note)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = Arc::new(MockRepository::<Note>::new());
//!     mock.expect_find().return_ok(None);
//!     mock.expect_update().return_err(RepositoryError::Unavailable("disk full".into()));
//!
//!     let (actor, note) = EntityActor::<Note>::new(NoteId(1), mock.clone(), 8);
//!     tokio::spawn(actor.run());
//!
//!     let result = note.ask("hello".to_string()).await;
//!     assert!(matches!(result, Err(NoteError::Framework(FrameworkError::Persistence(_)))));
//!     assert_eq!(mock.updates().len(), 1);
//!     mock.verify();
//! }
//! ```
//! </details>
//!
//! <details>
//! <summary><b>Pattern 2: Full Region Test</b></summary>
//!
//! **When to use**: routing, lazy restart, passivation and rebalancing. Use the
//! [`InMemoryRepository`](crate::InMemoryRepository), optionally with latency, and drive the
//! region through its client. See `tests/integration_test.rs` in each crate.
//! </details>

use crate::entity::ShardedEntity;
use crate::error::RepositoryError;
use crate::repository::Repository;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// A scripted store call, consumed in order.
enum Expectation<T: ShardedEntity> {
    Find {
        delay: Duration,
        response: Result<Option<T>, RepositoryError>,
    },
    /// `Ok(())` echoes the written snapshot back as the durable version.
    Update {
        delay: Duration,
        response: Result<(), RepositoryError>,
    },
}

impl<T: ShardedEntity> Expectation<T> {
    fn name(&self) -> &'static str {
        match self {
            Expectation::Find { .. } => "find",
            Expectation::Update { .. } => "update",
        }
    }
}

type Expectations<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

/// A scripted repository with call recording.
///
/// # Example
/// ```ignore
/// let mock = Arc::new(MockRepository::<Order>::new());
/// mock.expect_find().return_ok(None);
/// mock.expect_update().delay(Duration::from_millis(50)).return_ok();
///
/// let region = ShardRegion::new(mock.clone(), RegionSettings::default())?;
/// // Drive the region...
/// mock.verify(); // Ensures every expectation was consumed
/// ```
pub struct MockRepository<T: ShardedEntity> {
    expectations: Expectations<T>,
    finds: Mutex<Vec<T::Id>>,
    updates: Mutex<Vec<T>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl<T: ShardedEntity> Default for MockRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ShardedEntity> MockRepository<T> {
    /// Creates a mock with no expectations. Any call panics until one is added.
    pub fn new() -> Self {
        Self {
            expectations: Arc::new(Mutex::new(VecDeque::new())),
            finds: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Expects a `find` call.
    pub fn expect_find(&self) -> FindExpectationBuilder<T> {
        FindExpectationBuilder {
            delay: Duration::ZERO,
            expectations: self.expectations.clone(),
        }
    }

    /// Expects an `update` call.
    pub fn expect_update(&self) -> UpdateExpectationBuilder<T> {
        UpdateExpectationBuilder {
            delay: Duration::ZERO,
            expectations: self.expectations.clone(),
        }
    }

    /// Ids passed to `find`, in call order.
    pub fn finds(&self) -> Vec<T::Id> {
        self.finds.lock().unwrap().clone()
    }

    /// Snapshots passed to `update`, in call order.
    pub fn updates(&self) -> Vec<T> {
        self.updates.lock().unwrap().clone()
    }

    /// Highest number of `update` calls that were running at the same time.
    pub fn max_concurrent_updates(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            let remaining: Vec<&str> = exps.iter().map(Expectation::name).collect();
            panic!("Not all expectations were met. Remaining: {:?}", remaining);
        }
    }

    fn next(&self, call: &str) -> Expectation<T> {
        let mut exps = self.expectations.lock().unwrap();
        match exps.pop_front() {
            Some(expectation) => expectation,
            None => panic!("Unexpected {} call, no expectations left", call),
        }
    }
}

#[async_trait]
impl<T: ShardedEntity> Repository<T> for MockRepository<T> {
    async fn find(&self, id: &T::Id) -> Result<Option<T>, RepositoryError> {
        self.finds.lock().unwrap().push(id.clone());
        match self.next("find") {
            Expectation::Find { delay, response } => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                response
            }
            other => panic!("Expected {}, got find for {}", other.name(), id),
        }
    }

    async fn update(&self, snapshot: T) -> Result<T, RepositoryError> {
        self.updates.lock().unwrap().push(snapshot.clone());
        let (delay, response) = match self.next("update") {
            Expectation::Update { delay, response } => (delay, response),
            other => panic!("Expected {}, got update for {}", other.name(), snapshot.id()),
        };

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        response.map(|()| snapshot)
    }
}

/// Builder for `find` expectations.
pub struct FindExpectationBuilder<T: ShardedEntity> {
    delay: Duration,
    expectations: Expectations<T>,
}

impl<T: ShardedEntity> FindExpectationBuilder<T> {
    /// Holds the call for `delay` before answering.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: Option<T>) {
        self.push(Ok(value));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: RepositoryError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<Option<T>, RepositoryError>) {
        self.expectations.lock().unwrap().push_back(Expectation::Find {
            delay: self.delay,
            response,
        });
    }
}

/// Builder for `update` expectations.
pub struct UpdateExpectationBuilder<T: ShardedEntity> {
    delay: Duration,
    expectations: Expectations<T>,
}

impl<T: ShardedEntity> UpdateExpectationBuilder<T> {
    /// Holds the call for `delay` before answering.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Accept the write and echo the snapshot back.
    pub fn return_ok(self) {
        self.push(Ok(()));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: RepositoryError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<(), RepositoryError>) {
        self.expectations
            .lock()
            .unwrap()
            .push_back(Expectation::Update {
                delay: self.delay,
                response,
            });
    }
}
