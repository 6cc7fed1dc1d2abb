//! Actor registry for discovering actors by department.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use queue_core::DepartmentId;
use ractor::ActorRef;

use crate::messages::{DepartmentMessage, SupervisorMessage};

/// Global actor registry.
///
/// Request handlers look department actors up here and only go through the
/// supervisor when a department has no live actor yet.
pub struct ActorRegistry {
    supervisor: RwLock<Option<ActorRef<SupervisorMessage>>>,
    departments: RwLock<HashMap<DepartmentId, ActorRef<DepartmentMessage>>>,
}

impl ActorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            supervisor: RwLock::new(None),
            departments: RwLock::new(HashMap::new()),
        }
    }

    /// Register the supervisor.
    pub fn register_supervisor(&self, supervisor: ActorRef<SupervisorMessage>) {
        *self.supervisor.write().unwrap_or_else(PoisonError::into_inner) = Some(supervisor);
    }

    /// Get the supervisor.
    pub fn get_supervisor(&self) -> Option<ActorRef<SupervisorMessage>> {
        self.supervisor
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forget the supervisor and every department actor.
    pub fn clear_supervisor(&self) {
        *self.supervisor.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.departments
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Register a department actor.
    pub fn register_department(&self, department_id: DepartmentId, actor: ActorRef<DepartmentMessage>) {
        self.departments
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(department_id, actor);
    }

    /// Unregister a department actor.
    pub fn unregister_department(&self, department_id: DepartmentId) {
        self.departments
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&department_id);
    }

    /// Get a department actor.
    pub fn get_department(&self, department_id: DepartmentId) -> Option<ActorRef<DepartmentMessage>> {
        self.departments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&department_id)
            .cloned()
    }
}

impl Default for ActorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global registry instance.
static REGISTRY: std::sync::LazyLock<ActorRegistry> = std::sync::LazyLock::new(ActorRegistry::new);

/// Get the global actor registry.
pub fn global_registry() -> &'static ActorRegistry {
    &REGISTRY
}
