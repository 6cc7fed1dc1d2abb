//! Department, patient and current-token types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{TokenId, TokenStatus, ValidationError};

/// Identifier of a department (a hospital specialization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepartmentId(pub i64);

impl DepartmentId {
    /// Validate a raw department id; ids are positive integers.
    pub fn new(raw: i64) -> Result<Self, ValidationError> {
        if raw > 0 {
            Ok(Self(raw))
        } else {
            Err(ValidationError::InvalidDepartment(raw.to_string()))
        }
    }

    /// Parse a department id from a string such as a query parameter.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let raw = s
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidDepartment(s.to_string()))?;
        Self::new(raw)
    }

    /// Validate an optional JSON value carrying a department id.
    ///
    /// Accepts integers and integer strings, as display pages send both.
    pub fn from_json(value: Option<&serde_json::Value>) -> Result<Self, ValidationError> {
        match value {
            None | Some(serde_json::Value::Null) => Err(ValidationError::MissingDepartment),
            Some(serde_json::Value::Number(n)) => n
                .as_i64()
                .ok_or_else(|| ValidationError::InvalidDepartment(n.to_string()))
                .and_then(Self::new),
            Some(serde_json::Value::String(s)) if s.trim().is_empty() => {
                Err(ValidationError::MissingDepartment)
            }
            Some(serde_json::Value::String(s)) => Self::parse(s),
            Some(other) => Err(ValidationError::InvalidDepartment(other.to_string())),
        }
    }
}

impl std::fmt::Display for DepartmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Static reference data for a department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
}

impl Department {
    pub fn new(id: DepartmentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A registered patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: String,
    pub first_name: String,
    pub last_name: String,
}

impl Patient {
    /// Build a patient from a full name; the first word is the first name.
    pub fn from_full_name(patient_id: impl Into<String>, name: &str) -> Self {
        let mut parts = name.split_whitespace();
        let first_name = parts.next().unwrap_or_default().to_string();
        let last_name = parts.collect::<Vec<_>>().join(" ");
        Self {
            patient_id: patient_id.into(),
            first_name,
            last_name,
        }
    }

    /// Name as shown on displays.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// The token a department is currently displaying. One per department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentToken {
    pub department_id: DepartmentId,
    pub token: TokenId,
    /// Daily sequence number of the referenced token.
    pub seq: u32,
    pub patient_id: String,
    pub updated_at: DateTime<Utc>,
}

/// The current token resolved with what displays need to show it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentView {
    pub current: CurrentToken,
    pub name: String,
    /// Status of the referenced token, if the token row still exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TokenStatus>,
}
