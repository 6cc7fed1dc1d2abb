//! Database schema definitions using SurrealQL.

use crate::{DbError, get_db};

/// Initialize the database schema.
///
/// This creates all necessary tables, fields, and indexes.
pub async fn init_schema() -> Result<(), DbError> {
    let db = get_db()?;

    tracing::info!("Initializing database schema...");

    db.query(DEPARTMENT_SCHEMA).await?.check()?;
    db.query(PATIENT_SCHEMA).await?.check()?;
    db.query(TOKEN_SCHEMA).await?.check()?;
    db.query(CURRENT_TOKEN_SCHEMA).await?.check()?;

    tracing::info!("Database schema initialized");

    Ok(())
}

/// Department (specialization) reference data, keyed by department id.
const DEPARTMENT_SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS specializations SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS specialization_id ON specializations TYPE int;
DEFINE FIELD IF NOT EXISTS name ON specializations TYPE string;

DEFINE INDEX IF NOT EXISTS specialization_id ON specializations FIELDS specialization_id UNIQUE;
"#;

/// Patients, keyed by patient id.
const PATIENT_SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS patients SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS patient_id ON patients TYPE string;
DEFINE FIELD IF NOT EXISTS first_name ON patients TYPE string;
DEFINE FIELD IF NOT EXISTS last_name ON patients TYPE string DEFAULT "";
"#;

/// Patient tokens, keyed by the external token string.
const TOKEN_SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS patient_tokens SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS token ON patient_tokens TYPE string;
DEFINE FIELD IF NOT EXISTS seq ON patient_tokens TYPE int ASSERT $value >= 1;
DEFINE FIELD IF NOT EXISTS department_id ON patient_tokens TYPE int;
DEFINE FIELD IF NOT EXISTS patient_id ON patient_tokens TYPE string;
DEFINE FIELD IF NOT EXISTS date ON patient_tokens TYPE string;
DEFINE FIELD IF NOT EXISTS queue_day ON patient_tokens TYPE string;
DEFINE FIELD IF NOT EXISTS slot ON patient_tokens TYPE string;
DEFINE FIELD IF NOT EXISTS status ON patient_tokens TYPE string
    ASSERT $value IN ["waiting", "consulting", "recall", "hold", "no_show", "completed"];
-- Unix epoch milliseconds; FIFO key within a status tier
DEFINE FIELD IF NOT EXISTS status_changed_at ON patient_tokens TYPE int;
DEFINE FIELD IF NOT EXISTS created_at ON patient_tokens TYPE string;
DEFINE FIELD IF NOT EXISTS expires_at ON patient_tokens TYPE string;

-- One row per department, day and sequence number.
-- Day queries filter on queue_day and never go through this index.
DEFINE INDEX IF NOT EXISTS token_slot ON patient_tokens FIELDS slot UNIQUE;
"#;

/// Current token pointer, keyed by department id so there is at most one per department.
const CURRENT_TOKEN_SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS current_token SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS department_id ON current_token TYPE int;
DEFINE FIELD IF NOT EXISTS token_uuid ON current_token TYPE string;
DEFINE FIELD IF NOT EXISTS token_number ON current_token TYPE int;
DEFINE FIELD IF NOT EXISTS patient_id ON current_token TYPE string;
-- Unix epoch milliseconds
DEFINE FIELD IF NOT EXISTS updated_at ON current_token TYPE int;
"#;
