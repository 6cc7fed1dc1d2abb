//! Core domain types for the patient token queue.
//!
//! This crate contains shared types used across all packages:
//! - Token and TokenStatus for queue tickets
//! - Department, Patient and CurrentToken reference data
//! - The token selector deciding who is served next
//! - Events for real-time display updates

mod department;
mod error;
mod events;
mod registration;
pub mod selector;
mod token;

pub use department::{CurrentToken, CurrentView, Department, DepartmentId, Patient};
pub use error::ValidationError;
pub use events::{DisplayUpdate, QueueEvent, TokenLabel};
pub use registration::{Registration, RegistrationRequest, VISIT_TIME_FORMAT};
pub use selector::select_next;
pub use token::{Token, TokenId, TokenStatus};
