//! Event types for real-time display updates.

use serde::{Deserialize, Serialize};

use crate::{DepartmentId, Token, TokenStatus};

/// What the token slot of a display shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenLabel {
    /// Daily sequence number of the token.
    Number(u32),
    /// Placeholder text, `"--"` for an empty display.
    Text(String),
}

impl TokenLabel {
    /// Label for a display with nothing to show.
    pub fn empty() -> Self {
        TokenLabel::Text("--".to_string())
    }
}

/// Payload of an `update-token` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayUpdate {
    pub token: TokenLabel,
    pub name: String,
    pub department_id: DepartmentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TokenStatus>,
    /// Tells displays to re-render (and re-announce) even if nothing changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
}

impl DisplayUpdate {
    /// A token now shown with the given status.
    pub fn showing(seq: u32, name: impl Into<String>, department_id: DepartmentId, status: TokenStatus) -> Self {
        Self {
            token: TokenLabel::Number(seq),
            name: name.into(),
            department_id,
            status: Some(status),
            force: None,
        }
    }

    /// A forced re-announcement of the current token.
    pub fn announce(seq: u32, name: impl Into<String>, department_id: DepartmentId) -> Self {
        Self {
            token: TokenLabel::Number(seq),
            name: name.into(),
            department_id,
            status: None,
            force: Some(true),
        }
    }

    /// Clears the department's display.
    pub fn cleared(department_id: DepartmentId) -> Self {
        Self {
            token: TokenLabel::empty(),
            name: "No more tokens".to_string(),
            department_id,
            status: None,
            force: Some(true),
        }
    }
}

/// Events published to display subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum QueueEvent {
    /// The department's display should show a token (or nothing).
    #[serde(rename = "update-token")]
    UpdateToken(DisplayUpdate),
    /// A patient joined a department's queue.
    #[serde(rename = "token-registered")]
    TokenRegistered(Token),
}

impl QueueEvent {
    /// Get the department this event concerns.
    pub fn department_id(&self) -> DepartmentId {
        match self {
            QueueEvent::UpdateToken(update) => update.department_id,
            QueueEvent::TokenRegistered(token) => token.department_id,
        }
    }

    /// Get the wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            QueueEvent::UpdateToken(_) => "update-token",
            QueueEvent::TokenRegistered(_) => "token-registered",
        }
    }

    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        match self {
            QueueEvent::UpdateToken(DisplayUpdate {
                token: TokenLabel::Number(seq),
                department_id,
                status,
                ..
            }) => match status {
                Some(status) => format!("Department {} shows token {} ({})", department_id, seq, status),
                None => format!("Department {} re-announces token {}", department_id, seq),
            },
            QueueEvent::UpdateToken(update) => {
                format!("Department {} display cleared", update.department_id)
            }
            QueueEvent::TokenRegistered(token) => {
                format!("Token {} registered in department {}", token.seq, token.department_id)
            }
        }
    }
}
