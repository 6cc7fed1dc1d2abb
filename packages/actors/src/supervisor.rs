//! Supervisor actor for spawning and tracking department actors.

use std::collections::HashMap;
use std::sync::LazyLock;

use queue_core::DepartmentId;
use ractor::{Actor, ActorProcessingErr, ActorRef, SupervisionEvent};
use tokio::sync::Mutex;

use crate::department_actor::{DepartmentActor, DepartmentActorState};
use crate::messages::{ActorError, DepartmentMessage, SupervisorMessage};
use crate::registry::global_registry;

/// State for the supervisor actor.
#[derive(Default)]
pub struct SupervisorState {
    /// Department actors by department ID.
    pub departments: HashMap<DepartmentId, ActorRef<DepartmentMessage>>,
}

async fn spawn_department_actor(
    myself: ActorRef<SupervisorMessage>,
    state: &mut SupervisorState,
    department_id: DepartmentId,
) -> Result<ActorRef<DepartmentMessage>, ActorError> {
    let (actor, _handle) = Actor::spawn_linked(
        None,
        DepartmentActor,
        DepartmentActorState::new(department_id),
        myself.get_cell(),
    )
    .await
    .map_err(|e| ActorError::Unavailable(format!("Failed to spawn department {}: {}", department_id, e)))?;

    state.departments.insert(department_id, actor.clone());
    global_registry().register_department(department_id, actor.clone());

    Ok(actor)
}

/// Supervisor actor that owns all department actors.
pub struct Supervisor;

impl Actor for Supervisor {
    type Msg = SupervisorMessage;
    type State = SupervisorState;
    type Arguments = ();

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        _args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!("Starting department supervisor");
        Ok(SupervisorState::default())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SupervisorMessage::GetDepartment {
                department_id,
                reply,
            } => {
                if let Some(actor) = state.departments.get(&department_id) {
                    let _ = reply.send(Ok(actor.clone()));
                    return Ok(());
                }

                let result = spawn_department_actor(myself.clone(), state, department_id).await;
                let _ = reply.send(result);
            }

            SupervisorMessage::Shutdown => {
                tracing::info!("Shutting down supervisor");
                for (department_id, actor) in state.departments.drain() {
                    global_registry().unregister_department(department_id);
                    let _ = actor.send_message(DepartmentMessage::Shutdown);
                }
                global_registry().clear_supervisor();
                myself.stop(None);
                return Ok(());
            }
        }

        Ok(())
    }

    async fn handle_supervisor_evt(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: SupervisionEvent,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let (cell, reason) = match message {
            SupervisionEvent::ActorTerminated(cell, _, reason) => (cell, reason),
            SupervisionEvent::ActorFailed(cell, err) => (cell, Some(err.to_string())),
            _ => return Ok(()),
        };

        tracing::warn!("Department actor {} stopped: {:?}", cell.get_id(), reason);

        // Forget it so the next request for the department spawns a fresh actor.
        let stopped = cell.get_id();
        let gone: Vec<DepartmentId> = state
            .departments
            .iter()
            .filter(|(_, actor)| actor.get_id() == stopped)
            .map(|(id, _)| *id)
            .collect();
        for department_id in gone {
            state.departments.remove(&department_id);
            global_registry().unregister_department(department_id);
        }

        Ok(())
    }
}

/// Serializes supervisor startup.
static START_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Start the supervisor.
pub async fn start_supervisor()
-> Result<(ActorRef<SupervisorMessage>, tokio::task::JoinHandle<()>), ractor::SpawnErr> {
    let (actor, handle) = Actor::spawn(Some("supervisor".to_string()), Supervisor, ()).await?;

    Ok((actor, handle))
}

/// Get the running supervisor, starting and registering it on first use.
pub async fn ensure_supervisor() -> Result<ActorRef<SupervisorMessage>, ActorError> {
    if let Some(supervisor) = global_registry().get_supervisor() {
        return Ok(supervisor);
    }

    let _guard = START_LOCK.lock().await;
    if let Some(supervisor) = global_registry().get_supervisor() {
        return Ok(supervisor);
    }

    let (supervisor, _handle) = start_supervisor()
        .await
        .map_err(|e| ActorError::Unavailable(format!("Failed to start supervisor: {}", e)))?;
    global_registry().register_supervisor(supervisor.clone());

    Ok(supervisor)
}
