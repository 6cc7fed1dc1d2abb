//! Patient repository for the `patients` table.

use queue_core::Patient;

use crate::{DbError, get_db, with_timeout};

/// Repository for patient persistence operations.
pub struct PatientRepository;

impl PatientRepository {
    /// Create or overwrite a patient.
    pub async fn upsert(patient: &Patient) -> Result<Patient, DbError> {
        with_timeout(async {
            let db = get_db()?;

            let mut result = db
                .query("UPSERT type::thing('patients', $id) CONTENT $patient RETURN AFTER")
                .bind(("id", patient.patient_id.clone()))
                .bind(("patient", patient.clone()))
                .await?;

            let records: Vec<Patient> = result.take(0)?;

            records
                .into_iter()
                .next()
                .ok_or_else(|| DbError::Query("Failed to upsert patient".into()))
        })
        .await
    }

    /// Get a patient by ID.
    pub async fn get(patient_id: &str) -> Result<Option<Patient>, DbError> {
        with_timeout(async {
            let db = get_db()?;

            let record: Option<Patient> = db.select(("patients", patient_id.to_string())).await?;

            Ok::<_, DbError>(record)
        })
        .await
    }

    /// Display name of a patient, or "Unknown" if the patient is not on record.
    pub async fn display_name(patient_id: &str) -> Result<String, DbError> {
        Ok(Self::get(patient_id)
            .await?
            .map(|p| p.display_name())
            .unwrap_or_else(|| "Unknown".to_string()))
    }
}
