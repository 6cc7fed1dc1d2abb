//! Department actor serializing all queue operations of one department.

use queue_core::DepartmentId;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};

use crate::lifecycle;
use crate::messages::DepartmentMessage;

/// State for the department actor.
pub struct DepartmentActorState {
    pub department_id: DepartmentId,
    /// Operations handled since the actor started.
    handled: u64,
}

impl DepartmentActorState {
    /// Create a new department actor state.
    pub fn new(department_id: DepartmentId) -> Self {
        Self {
            department_id,
            handled: 0,
        }
    }
}

/// Whether the caller stopped waiting before the message was dequeued.
/// Queue changes are never applied for such callers.
fn caller_gone<T>(department_id: DepartmentId, operation: &str, reply: &RpcReplyPort<T>) -> bool {
    if reply.is_closed() {
        tracing::warn!(
            "Department {}: caller gone, skipping {}",
            department_id,
            operation
        );
        return true;
    }
    false
}

/// Actor owning the exclusive scope for one department's queue.
///
/// Call-next, move-next and registration for a department are messages to
/// this actor, so their read-select-write sequences never interleave.
/// Departments have separate actors and run in parallel.
pub struct DepartmentActor;

impl Actor for DepartmentActor {
    type Msg = DepartmentMessage;
    type State = DepartmentActorState;
    type Arguments = DepartmentActorState;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!("Starting department actor: {}", args.department_id);
        Ok(args)
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let department_id = state.department_id;
        state.handled += 1;

        match message {
            DepartmentMessage::CallNext { reply } => {
                if caller_gone(department_id, "call-next", &reply) {
                    return Ok(());
                }
                let result = lifecycle::call_next(department_id).await;
                if let Err(e) = &result {
                    tracing::warn!("Department {}: call-next failed: {}", department_id, e);
                }
                let _ = reply.send(result);
            }

            DepartmentMessage::MoveNext { reply } => {
                if caller_gone(department_id, "move-next", &reply) {
                    return Ok(());
                }
                let result = lifecycle::move_next(department_id).await;
                if let Err(e) = &result {
                    tracing::warn!("Department {}: move-next failed: {}", department_id, e);
                }
                let _ = reply.send(result);
            }

            DepartmentMessage::Register {
                registration,
                reply,
            } => {
                if caller_gone(department_id, "registration", &reply) {
                    return Ok(());
                }
                let result = lifecycle::register(*registration).await;
                if let Err(e) = &result {
                    tracing::warn!("Department {}: registration failed: {}", department_id, e);
                }
                let _ = reply.send(result);
            }

            DepartmentMessage::Current { reply } => {
                let _ = reply.send(lifecycle::current(department_id).await);
            }

            DepartmentMessage::Announce { reply } => {
                if caller_gone(department_id, "announce", &reply) {
                    return Ok(());
                }
                let _ = reply.send(lifecycle::announce(department_id).await);
            }

            DepartmentMessage::Shutdown => {
                tracing::info!(
                    "Shutting down department actor {} after {} operations",
                    department_id,
                    state.handled
                );
                myself.stop(None);
            }
        }

        Ok(())
    }
}
