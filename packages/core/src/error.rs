//! Validation errors for client-supplied input.

use thiserror::Error;

/// Input rejected before any storage is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing department_id")]
    MissingDepartment,
    #[error("Invalid department_id: {0}")]
    InvalidDepartment(String),
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Invalid date_time '{0}', expected YYYY-MM-DDTHH:MM")]
    InvalidVisitTime(String),
    #[error("Unknown token status: {0}")]
    UnknownStatus(String),
}
