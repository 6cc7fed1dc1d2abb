//! Actor system for the patient token queue.
//!
//! Every department gets one `DepartmentActor`; call-next, move-next and
//! registration for a department are messages to it and never interleave.
//!
//! # Architecture
//!
//! - `Supervisor` - Spawns department actors on first use
//! - `DepartmentActor` - Runs the token lifecycle for one department
//! - `QueueService` - Request entry point, publishes display events after
//!   the actor replies
//!
//! # Usage
//!
//! ```ignore
//! use actors::{ChannelBroadcaster, QueueService, ensure_supervisor};
//!
//! ensure_supervisor().await?;
//! let service = QueueService::new(Arc::new(ChannelBroadcaster::default()));
//! let outcome = service.call_next(DepartmentId(1)).await?;
//! ```

pub mod broadcast;
mod department_actor;
pub mod lifecycle;
mod messages;
pub mod registry;
mod service;
mod supervisor;

pub use broadcast::{BroadcastError, Broadcaster, ChannelBroadcaster, publish_all};
pub use department_actor::{DepartmentActor, DepartmentActorState};
pub use lifecycle::{Announcement, Outcome, Registered, Served};
pub use messages::{ActorError, ActorResult, DepartmentMessage, SupervisorMessage};
pub use registry::{ActorRegistry, global_registry};
pub use service::{DEFAULT_REPLY_TIMEOUT, QueueService};
pub use supervisor::{Supervisor, SupervisorState, ensure_supervisor, start_supervisor};

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef, RpcReplyPort, concurrency};
