//! # Entity Runtime
//!
//! This module defines the `EntityActor`, one sequential worker per live entity identity.
//! It hydrates its snapshot from the repository, applies commands one at a time, and keeps
//! at most one write in flight. Everything that arrives while it is waiting on the store
//! is stashed and replayed in arrival order afterwards.
//!
//! ## Lifecycle
//!
//! ```text
//! Loading ──ok──▶ Ready ──persist──▶ Busy ──ok──▶ Ready ...
//!    │                                 │
//!    └──err──▶ Terminated ◀───err──────┘
//! ```
//!
//! ## Failure policy
//!
//! * **Load failure**: the runtime exits without replying. Buffered callers see their reply
//!   channel dropped (`ActorDropped`); nobody is correlated with the load.
//! * **Write failure**: the waiting caller receives `Persistence(cause)`, every command
//!   buffered behind the write is failed with the same cause, and the runtime exits. The
//!   store still holds the last committed snapshot, so a fresh instance reloads it.
//! * **Passivation**: the mailbox is closed, everything already buffered is processed and
//!   answered normally, then the runtime exits and acknowledges.

use crate::client::EntityRef;
use crate::entity::{Effect, ShardedEntity};
use crate::error::{FrameworkError, RepositoryError};
use crate::message::{CommandResponse, EntityRequest};
use crate::repository::Repository;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

/// Where the runtime is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the identity lease and the initial `find`.
    Loading,
    /// Idle or applying an in-memory command.
    Ready,
    /// One write is in flight; new messages are stashed.
    Busy,
}

/// Why a runtime stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    /// Passivated or every handle was dropped. State is reconstructible from the store.
    Stopped,
    /// The initial `find` failed.
    LoadFailed(RepositoryError),
    /// A write failed; memory may disagree with the store.
    UpdateFailed(RepositoryError),
}

/// Exclusive right to host one identity. A replacement instance waits for the previous
/// instance to release it before loading, so two instances never write concurrently.
pub type IdentityLease = Arc<Mutex<()>>;

/// The runtime for one entity identity.
///
/// # Concurrency Model
/// Each `EntityActor` runs in its own Tokio task and handles its mailbox sequentially, so
/// the snapshot needs no lock. The only suspension points are the lease, the initial
/// `find` and each `update`; while suspended the mailbox keeps being drained into the
/// stash so callers never block on a full channel behind a slow store.
pub struct EntityActor<T: ShardedEntity> {
    id: T::Id,
    receiver: mpsc::Receiver<EntityRequest<T>>,
    repository: Arc<dyn Repository<T>>,
    lease: IdentityLease,
    stash: VecDeque<EntityRequest<T>>,
    snapshot: Option<T>,
    phase: Phase,
    stop_requests: Vec<oneshot::Sender<()>>,
    mailbox_open: bool,
}

impl<T: ShardedEntity> EntityActor<T> {
    /// Creates a runtime and its handle. Nothing happens until `run` is awaited.
    ///
    /// # Arguments
    ///
    /// * `mailbox_size` - capacity of the mailbox channel. The stash behind it is unbounded.
    pub fn new(
        id: T::Id,
        repository: Arc<dyn Repository<T>>,
        mailbox_size: usize,
    ) -> (Self, EntityRef<T>) {
        let (sender, receiver) = mpsc::channel(mailbox_size.max(1));
        let actor = Self {
            id: id.clone(),
            receiver,
            repository,
            lease: Arc::new(Mutex::new(())),
            stash: VecDeque::new(),
            snapshot: None,
            phase: Phase::Loading,
            stop_requests: Vec::new(),
            mailbox_open: true,
        };
        (actor, EntityRef::new(id, sender))
    }

    /// Shares an identity lease with earlier instances of the same entity.
    pub fn with_lease(mut self, lease: IdentityLease) -> Self {
        self.lease = lease;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Runs the runtime until it is passivated, loses all handles, or fails.
    pub async fn run(mut self) -> Termination {
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        let id = self.id.clone();
        info!(entity_type, %id, "Entity started");

        let lease = Arc::clone(&self.lease);
        let _guard: OwnedMutexGuard<()> = self.await_buffering(lease.lock_owned()).await;

        let repository = Arc::clone(&self.repository);
        let lookup = id.clone();
        let loaded = self
            .await_buffering(async move { repository.find(&lookup).await })
            .await;
        match loaded {
            Ok(snapshot) => {
                info!(entity_type, %id, found = snapshot.is_some(), stashed = self.stash.len(), "Loaded");
                self.snapshot = snapshot;
                self.phase = Phase::Ready;
            }
            Err(e) => {
                error!(entity_type, %id, error = %e, stashed = self.stash.len(), "Load failed, terminating");
                return Termination::LoadFailed(e);
            }
        }

        while let Some(request) = self.next_request().await {
            match request {
                EntityRequest::Passivate { respond_to } => {
                    debug!(entity_type, %id, backlog = self.stash.len(), "Passivating");
                    self.stop_requests.push(respond_to);
                    self.receiver.close();
                }
                EntityRequest::Command {
                    command,
                    respond_to,
                } => {
                    if let Err(e) = self.process(entity_type, command, respond_to).await {
                        let failed = self.fail_backlog(&e);
                        error!(entity_type, %id, error = %e, failed, "Update failed, terminating");
                        return Termination::UpdateFailed(e);
                    }
                }
            }
        }

        for stopped in self.stop_requests.drain(..) {
            let _ = stopped.send(());
        }
        info!(entity_type, %id, "Stopped");
        Termination::Stopped
    }

    /// Stashed messages first, then the mailbox. `None` once both are exhausted and the
    /// mailbox is closed.
    async fn next_request(&mut self) -> Option<EntityRequest<T>> {
        if let Some(request) = self.stash.pop_front() {
            return Some(request);
        }
        if !self.mailbox_open {
            return None;
        }
        self.receiver.recv().await
    }

    async fn process(
        &mut self,
        entity_type: &str,
        command: T::Command,
        respond_to: CommandResponse<T>,
    ) -> Result<(), RepositoryError> {
        debug!(entity_type, id = %self.id, ?command, "Command");
        match T::handle(&self.id, self.snapshot.as_ref(), command) {
            Effect::Reply(result) => {
                if let Err(e) = &result {
                    warn!(entity_type, id = %self.id, error = %e, "Rejected");
                }
                let _ = respond_to.send(result);
                Ok(())
            }
            Effect::Persist { snapshot, reply } => {
                self.phase = Phase::Busy;
                let repository = Arc::clone(&self.repository);
                let written = self
                    .await_buffering(async move { repository.update(snapshot).await })
                    .await;
                match written {
                    Ok(stored) => {
                        info!(entity_type, id = %self.id, stashed = self.stash.len(), "Persisted");
                        self.snapshot = Some(stored.clone());
                        self.phase = Phase::Ready;
                        let _ = respond_to.send(Ok(reply(stored)));
                        Ok(())
                    }
                    Err(e) => {
                        // Closed before replying, so a retry routes to a fresh instance.
                        self.receiver.close();
                        let _ = respond_to
                            .send(Err(T::Error::from(FrameworkError::Persistence(e.clone()))));
                        Err(e)
                    }
                }
            }
        }
    }

    /// Awaits `operation` while moving everything that arrives into the stash.
    async fn await_buffering<F, R>(&mut self, operation: F) -> R
    where
        F: Future<Output = R>,
    {
        tokio::pin!(operation);
        loop {
            tokio::select! {
                biased;
                result = &mut operation => return result,
                request = self.receiver.recv(), if self.mailbox_open => match request {
                    Some(request) => self.stash.push_back(request),
                    None => self.mailbox_open = false,
                },
            }
        }
    }

    /// Fails every buffered command with `cause` and closes the mailbox. Returns how many
    /// callers were answered.
    fn fail_backlog(&mut self, cause: &RepositoryError) -> usize {
        self.receiver.close();
        let mut failed = 0;
        let mut pending: Vec<EntityRequest<T>> = self.stash.drain(..).collect();
        while let Ok(request) = self.receiver.try_recv() {
            pending.push(request);
        }
        for request in pending {
            match request {
                EntityRequest::Command { respond_to, .. } => {
                    let error = T::Error::from(FrameworkError::Persistence(cause.clone()));
                    let _ = respond_to.send(Err(error));
                    failed += 1;
                }
                EntityRequest::Passivate { respond_to } => {
                    let _ = respond_to.send(());
                }
            }
        }
        for stopped in self.stop_requests.drain(..) {
            let _ = stopped.send(());
        }
        failed
    }
}
