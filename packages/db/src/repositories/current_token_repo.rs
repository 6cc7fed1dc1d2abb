//! Current-token pointer repository for the `current_token` table.

use chrono::{DateTime, Utc};
use queue_core::{CurrentToken, DepartmentId, Token, TokenId, TokenStatus};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use crate::{DbError, get_db, with_timeout};

/// Repository for the per-department current token.
pub struct CurrentTokenRepository;

/// Internal record type for SurrealDB.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CurrentTokenRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Thing>,
    department_id: i64,
    token_uuid: String,
    token_number: u32,
    patient_id: String,
    updated_at: i64,
}

impl CurrentTokenRecord {
    fn from_current(current: &CurrentToken) -> Self {
        Self {
            id: None,
            department_id: current.department_id.0,
            token_uuid: current.token.to_string(),
            token_number: current.seq,
            patient_id: current.patient_id.clone(),
            updated_at: current.updated_at.timestamp_millis(),
        }
    }

    fn into_current(self) -> Result<CurrentToken, DbError> {
        let token = TokenId::parse(&self.token_uuid)
            .map_err(|e| DbError::Serialization(format!("token_uuid: {}", e)))?;
        let updated_at = DateTime::<Utc>::from_timestamp_millis(self.updated_at)
            .ok_or_else(|| DbError::Serialization("updated_at out of range".into()))?;

        Ok(CurrentToken {
            department_id: DepartmentId(self.department_id),
            token,
            seq: self.token_number,
            patient_id: self.patient_id,
            updated_at,
        })
    }
}

impl CurrentTokenRepository {
    /// Get a department's current token, if one was ever set.
    pub async fn get(department_id: DepartmentId) -> Result<Option<CurrentToken>, DbError> {
        with_timeout(async {
            let db = get_db()?;

            let record: Option<CurrentTokenRecord> =
                db.select(("current_token", department_id.0)).await?;

            record.map(CurrentTokenRecord::into_current).transpose()
        })
        .await
    }

    /// Point a department at a token, optionally changing the token's status.
    ///
    /// The status change and the pointer overwrite run in one transaction:
    /// either both are applied or neither is.
    pub async fn point_to(
        token: &Token,
        new_status: Option<TokenStatus>,
        at: DateTime<Utc>,
    ) -> Result<CurrentToken, DbError> {
        let current = CurrentToken {
            department_id: token.department_id,
            token: token.token,
            seq: token.seq,
            patient_id: token.patient_id.clone(),
            updated_at: at,
        };

        with_timeout(async {
            let db = get_db()?;

            let mut statements = vec!["BEGIN TRANSACTION;"];
            if new_status.is_some() {
                statements.push(
                    "UPDATE type::thing('patient_tokens', $token_id) SET status = $status, status_changed_at = $at;",
                );
            }
            statements.push("UPSERT type::thing('current_token', $department_id) CONTENT $current;");
            statements.push("COMMIT TRANSACTION;");

            let mut query = db
                .query(statements.join("\n"))
                .bind(("token_id", token.token.to_string()))
                .bind(("department_id", token.department_id.0))
                .bind(("at", at.timestamp_millis()))
                .bind(("current", CurrentTokenRecord::from_current(&current)));

            if let Some(status) = new_status {
                query = query.bind(("status", status.as_str()));
            }

            query.await?.check()?;

            Ok::<_, DbError>(())
        })
        .await?;

        tracing::debug!(
            "Department {} now points at token {}",
            current.department_id,
            current.seq
        );

        Ok(current)
    }
}
