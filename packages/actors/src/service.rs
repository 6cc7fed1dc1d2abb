//! Entry point for queue operations.
//!
//! Routes each operation to its department's actor, waits for the reply with
//! a bound, and publishes the resulting display events once the actor is done.

use std::sync::Arc;
use std::time::Duration;

use queue_core::{CurrentView, DepartmentId, Registration};
use ractor::{ActorRef, concurrency};

use crate::broadcast::{Broadcaster, publish_all};
use crate::lifecycle::{Announcement, Outcome, Registered};
use crate::messages::{ActorError, ActorResult, DepartmentMessage, Reply, SupervisorMessage};
use crate::registry::global_registry;
use crate::supervisor::ensure_supervisor;

/// Default bound on waiting for an actor reply.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(30);

/// Queue operations for every department.
pub struct QueueService<B: Broadcaster> {
    broadcaster: Arc<B>,
    reply_timeout: Duration,
}

impl<B: Broadcaster> Clone for QueueService<B> {
    fn clone(&self) -> Self {
        Self {
            broadcaster: Arc::clone(&self.broadcaster),
            reply_timeout: self.reply_timeout,
        }
    }
}

impl<B: Broadcaster> QueueService<B> {
    pub fn new(broadcaster: Arc<B>) -> Self {
        Self {
            broadcaster,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }

    /// Set the bound on waiting for an actor reply.
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    pub fn broadcaster(&self) -> &Arc<B> {
        &self.broadcaster
    }

    /// Complete the current token and serve the next one.
    pub async fn call_next(&self, department_id: DepartmentId) -> ActorResult<Outcome> {
        let mut outcome = self
            .ask(department_id, |reply| DepartmentMessage::CallNext { reply })
            .await?;
        publish_all(self.broadcaster.as_ref(), std::mem::take(&mut outcome.events));
        Ok(outcome)
    }

    /// Move the current token along its recall path and serve the next one.
    pub async fn move_next(&self, department_id: DepartmentId) -> ActorResult<Outcome> {
        let mut outcome = self
            .ask(department_id, |reply| DepartmentMessage::MoveNext { reply })
            .await?;
        publish_all(self.broadcaster.as_ref(), std::mem::take(&mut outcome.events));
        Ok(outcome)
    }

    /// Register a patient in a department's queue.
    pub async fn register(&self, registration: Registration) -> ActorResult<Registered> {
        let department_id = registration.department_id;
        let mut registered = self
            .ask(department_id, |reply| DepartmentMessage::Register {
                registration: Box::new(registration.clone()),
                reply,
            })
            .await?;
        publish_all(self.broadcaster.as_ref(), std::mem::take(&mut registered.events));
        Ok(registered)
    }

    /// Read a department's current token.
    pub async fn current(&self, department_id: DepartmentId) -> ActorResult<Option<CurrentView>> {
        self.ask(department_id, |reply| DepartmentMessage::Current { reply })
            .await
    }

    /// Re-announce a department's current token.
    pub async fn announce(&self, department_id: DepartmentId) -> ActorResult<Announcement> {
        let mut announcement = self
            .ask(department_id, |reply| DepartmentMessage::Announce { reply })
            .await?;
        publish_all(self.broadcaster.as_ref(), std::mem::take(&mut announcement.events));
        Ok(announcement)
    }

    /// Send a request to a department's actor and wait for the reply.
    ///
    /// A stale actor reference is dropped and the request retried once
    /// through the supervisor.
    async fn ask<T, F>(&self, department_id: DepartmentId, build: F) -> ActorResult<T>
    where
        T: Send + 'static,
        F: Fn(Reply<T>) -> DepartmentMessage,
    {
        let actor = self.department_actor(department_id).await?;

        let (tx, rx) = concurrency::oneshot();
        let rx = match actor.send_message(build(tx.into())) {
            Ok(()) => rx,
            Err(e) => {
                tracing::warn!("Department {} actor unreachable, respawning: {}", department_id, e);
                global_registry().unregister_department(department_id);

                let actor = self.department_actor(department_id).await?;
                let (tx, rx) = concurrency::oneshot();
                actor
                    .send_message(build(tx.into()))
                    .map_err(|e| ActorError::Unavailable(e.to_string()))?;
                rx
            }
        };

        match tokio::time::timeout(self.reply_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ActorError::Unavailable(format!(
                "Department {} dropped the request",
                department_id
            ))),
            Err(_) => Err(ActorError::Timeout(department_id)),
        }
    }

    async fn department_actor(&self, department_id: DepartmentId) -> ActorResult<ActorRef<DepartmentMessage>> {
        if let Some(actor) = global_registry().get_department(department_id) {
            return Ok(actor);
        }

        let supervisor = ensure_supervisor().await?;
        let (tx, rx) = concurrency::oneshot();
        supervisor
            .send_message(SupervisorMessage::GetDepartment {
                department_id,
                reply: tx.into(),
            })
            .map_err(|e| ActorError::Unavailable(e.to_string()))?;

        match tokio::time::timeout(self.reply_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ActorError::Unavailable("Supervisor dropped the request".into())),
            Err(_) => Err(ActorError::Timeout(department_id)),
        }
    }
}
