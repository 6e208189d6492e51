//! # Entity Reference
//!
//! This module defines the handle used to talk to one running entity.

use crate::entity::ShardedEntity;
use crate::error::FrameworkError;
use crate::message::EntityRequest;
use tokio::sync::{mpsc, oneshot};

/// ## EntityRef
///
/// A cheap, cloneable handle to one [`EntityActor`](crate::EntityActor). It forwards
/// commands over the actor's mailbox and waits for the single reply on a oneshot channel.
///
/// * **Closed mailbox** – the instance has terminated or is passivating: `ActorClosed`.
/// * **Dropped reply** – the instance died while holding the request: `ActorDropped`.
pub struct EntityRef<T: ShardedEntity> {
    id: T::Id,
    sender: mpsc::Sender<EntityRequest<T>>,
}

impl<T: ShardedEntity> Clone for EntityRef<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            sender: self.sender.clone(),
        }
    }
}

/// Receiving half of an accepted command.
pub type PendingReply<T> =
    oneshot::Receiver<Result<<T as ShardedEntity>::Reply, <T as ShardedEntity>::Error>>;

impl<T: ShardedEntity> EntityRef<T> {
    pub fn new(id: T::Id, sender: mpsc::Sender<EntityRequest<T>>) -> Self {
        Self { id, sender }
    }

    pub fn id(&self) -> &T::Id {
        &self.id
    }

    /// `true` once the runtime has stopped accepting messages.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Sends a command and waits for the reply. No timeout is applied here.
    pub async fn ask(&self, command: T::Command) -> Result<T::Reply, T::Error> {
        let response = self
            .deliver(command)
            .await
            .map_err(|_| T::Error::from(FrameworkError::ActorClosed))?;
        response
            .await
            .map_err(|_| T::Error::from(FrameworkError::ActorDropped))?
    }

    /// Enqueues a command. A closed mailbox hands the command back so the caller can
    /// route it to a replacement instance.
    pub async fn deliver(&self, command: T::Command) -> Result<PendingReply<T>, T::Command> {
        let Ok(permit) = self.sender.reserve().await else {
            return Err(command);
        };
        let (respond_to, response) = oneshot::channel();
        permit.send(EntityRequest::Command {
            command,
            respond_to,
        });
        Ok(response)
    }

    /// Asks the runtime to stop after draining its backlog and waits until it has.
    ///
    /// Returns immediately if the mailbox is already closed.
    pub async fn passivate(&self) {
        let (respond_to, stopped) = oneshot::channel();
        if self
            .sender
            .send(EntityRequest::Passivate { respond_to })
            .await
            .is_ok()
        {
            let _ = stopped.await;
        }
    }
}
