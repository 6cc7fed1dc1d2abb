//! Token domain types for patients waiting in a department queue.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DepartmentId, ValidationError};

/// Opaque external token string handed to the patient (printed in the QR card).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(pub Uuid);

impl TokenId {
    /// Create a new random token ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a token ID from a string.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for TokenId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a token is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    /// Registered and waiting to be called.
    #[default]
    Waiting,
    /// With the doctor right now.
    Consulting,
    /// Called but did not show up; shown again before anyone waiting.
    Recall,
    /// Recalled without answer; shown after everyone waiting.
    Hold,
    /// Dropped from the active queue after hold.
    NoShow,
    /// Consultation finished.
    Completed,
}

impl TokenStatus {
    pub const ALL: [TokenStatus; 6] = [
        TokenStatus::Waiting,
        TokenStatus::Consulting,
        TokenStatus::Recall,
        TokenStatus::Hold,
        TokenStatus::NoShow,
        TokenStatus::Completed,
    ];

    /// Statuses the selector may pick from, highest priority first.
    pub const SELECTABLE: [TokenStatus; 3] =
        [TokenStatus::Recall, TokenStatus::Waiting, TokenStatus::Hold];

    /// Get the status string as stored and sent to displays.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStatus::Waiting => "waiting",
            TokenStatus::Consulting => "consulting",
            TokenStatus::Recall => "recall",
            TokenStatus::Hold => "hold",
            TokenStatus::NoShow => "no_show",
            TokenStatus::Completed => "completed",
        }
    }

    /// Selection tier, lower is served first. `None` means never selected.
    pub fn tier(&self) -> Option<u8> {
        match self {
            TokenStatus::Recall => Some(0),
            TokenStatus::Waiting => Some(1),
            TokenStatus::Hold => Some(2),
            _ => None,
        }
    }

    /// Check if the token can be picked as the next one to serve.
    pub fn is_selectable(&self) -> bool {
        self.tier().is_some()
    }

    /// Status a token takes when it becomes the current token.
    ///
    /// Only a waiting token is freshly served; recall and hold tokens are
    /// re-displayed with their status untouched.
    pub fn on_call(self) -> TokenStatus {
        match self {
            TokenStatus::Waiting => TokenStatus::Consulting,
            other => other,
        }
    }

    /// Status the current token takes on move-next.
    ///
    /// Returns `None` for statuses outside the `consulting -> recall -> hold`
    /// path; callers fall back to [`TokenStatus::Recall`].
    pub fn on_move(self) -> Option<TokenStatus> {
        match self {
            TokenStatus::Consulting => Some(TokenStatus::Recall),
            TokenStatus::Recall => Some(TokenStatus::Hold),
            TokenStatus::Hold => Some(TokenStatus::NoShow),
            _ => None,
        }
    }
}

impl std::fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TokenStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TokenStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}

/// A patient's queue ticket for one department on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// External token string.
    pub token: TokenId,
    /// Daily sequence number, dense from 1 per department per day.
    pub seq: u32,
    pub department_id: DepartmentId,
    pub patient_id: String,
    /// Queue day this token belongs to.
    pub date: NaiveDate,
    pub status: TokenStatus,
    /// When the status last changed; FIFO key within a status tier.
    pub status_changed_at: DateTime<Utc>,
    /// Visit time given at registration.
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

impl Token {
    /// Create a waiting token for a visit.
    pub fn new(
        seq: u32,
        department_id: DepartmentId,
        patient_id: impl Into<String>,
        visit_time: NaiveDateTime,
    ) -> Self {
        Self {
            token: TokenId::new(),
            seq,
            department_id,
            patient_id: patient_id.into(),
            date: visit_time.date(),
            status: TokenStatus::Waiting,
            status_changed_at: Utc::now(),
            created_at: visit_time,
            expires_at: visit_time + chrono::Duration::days(1),
        }
    }

    /// Set the status and its change time.
    pub fn with_status(mut self, status: TokenStatus, changed_at: DateTime<Utc>) -> Self {
        self.status = status;
        self.status_changed_at = changed_at;
        self
    }
}
