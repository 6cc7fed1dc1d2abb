//! Patient registration requests.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{DepartmentId, Patient, ValidationError};

/// Format of the visit time sent by the registration desk.
pub const VISIT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Registration payload as received from the desk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationRequest {
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub department_id: Option<serde_json::Value>,
    /// Informational only; the stored department name wins.
    #[serde(default)]
    pub department_name: Option<String>,
    #[serde(default)]
    pub date_time: Option<String>,
}

/// A validated registration.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub patient: Patient,
    pub department_id: DepartmentId,
    pub visit_time: NaiveDateTime,
    /// Visit time exactly as supplied, echoed back to the desk.
    pub date_time: String,
}

impl RegistrationRequest {
    /// Check required fields and parse the visit time.
    pub fn validate(self) -> Result<Registration, ValidationError> {
        let patient_id = non_empty(self.patient_id).ok_or(ValidationError::MissingField("patient_id"))?;
        let name = non_empty(self.name).ok_or(ValidationError::MissingField("name"))?;
        let department_id = DepartmentId::from_json(self.department_id.as_ref())?;
        let date_time = non_empty(self.date_time).ok_or(ValidationError::MissingField("date_time"))?;
        let visit_time = NaiveDateTime::parse_from_str(&date_time, VISIT_TIME_FORMAT)
            .map_err(|_| ValidationError::InvalidVisitTime(date_time.clone()))?;

        Ok(Registration {
            patient: Patient::from_full_name(patient_id, &name),
            department_id,
            visit_time,
            date_time,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
