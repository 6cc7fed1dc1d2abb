//! Message types for actor communication.

use queue_core::{CurrentView, DepartmentId, Registration, ValidationError};
use ractor::{ActorRef, RpcReplyPort};

use crate::lifecycle::{Announcement, Outcome, Registered};

/// Reply port for an operation that may fail.
pub type Reply<T> = RpcReplyPort<Result<T, ActorError>>;

/// Messages for the DepartmentActor.
///
/// Every message for one department is handled to completion before the
/// next one starts.
#[derive(Debug)]
pub enum DepartmentMessage {
    /// Complete the current token and serve the next one.
    CallNext { reply: Reply<Outcome> },

    /// Push the current token down its recall path and serve the next one.
    MoveNext { reply: Reply<Outcome> },

    /// Add a patient to the queue.
    Register {
        registration: Box<Registration>,
        reply: Reply<Registered>,
    },

    /// Read the current token.
    Current { reply: Reply<Option<CurrentView>> },

    /// Re-announce the current token.
    Announce { reply: Reply<Announcement> },

    /// Stop the actor.
    Shutdown,
}

/// Messages for the Supervisor.
#[derive(Debug)]
pub enum SupervisorMessage {
    /// Get the actor for a department, spawning it on first use.
    GetDepartment {
        department_id: DepartmentId,
        reply: Reply<ActorRef<DepartmentMessage>>,
    },

    /// Shutdown all department actors.
    Shutdown,
}

/// Result type for actor operations.
pub type ActorResult<T> = Result<T, ActorError>;

/// Error type for actor operations.
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] db::DbError),

    #[error("Actor unavailable: {0}")]
    Unavailable(String),

    #[error("Timed out waiting for department {0}")]
    Timeout(DepartmentId),
}
