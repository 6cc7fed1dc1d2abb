//! Token repository for the `patient_tokens` table.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use queue_core::{DepartmentId, Token, TokenId, TokenStatus};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use crate::{DbError, get_db, with_timeout};

/// Repository for token persistence operations.
pub struct TokenRepository;

/// Internal record type for SurrealDB.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TokenRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Thing>,
    token: String,
    seq: u32,
    department_id: i64,
    patient_id: String,
    date: String,
    /// `{department}/{date}`, the key every day query filters on.
    queue_day: String,
    /// `{department}/{date}/{seq}`, unique per token.
    slot: String,
    status: TokenStatus,
    status_changed_at: i64,
    created_at: String,
    expires_at: String,
}

/// Storage format of naive timestamps.
const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Storage key of a queue day.
pub(crate) fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Key of one department's queue for one day.
fn queue_day(department_id: DepartmentId, date: NaiveDate) -> String {
    format!("{}/{}", department_id, day_key(date))
}

fn parse_naive(field: &str, value: &str) -> Result<NaiveDateTime, DbError> {
    NaiveDateTime::parse_from_str(value, NAIVE_FORMAT)
        .map_err(|e| DbError::Serialization(format!("{}: {}", field, e)))
}

impl TokenRecord {
    fn from_token(token: &Token) -> Self {
        Self {
            id: None,
            token: token.token.to_string(),
            seq: token.seq,
            department_id: token.department_id.0,
            patient_id: token.patient_id.clone(),
            date: day_key(token.date),
            queue_day: queue_day(token.department_id, token.date),
            slot: format!("{}/{}", queue_day(token.department_id, token.date), token.seq),
            status: token.status,
            status_changed_at: token.status_changed_at.timestamp_millis(),
            created_at: token.created_at.format(NAIVE_FORMAT).to_string(),
            expires_at: token.expires_at.format(NAIVE_FORMAT).to_string(),
        }
    }

    fn into_token(self) -> Result<Token, DbError> {
        let token = TokenId::parse(&self.token)
            .map_err(|e| DbError::Serialization(format!("token: {}", e)))?;
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|e| DbError::Serialization(format!("date: {}", e)))?;
        let status_changed_at = DateTime::<Utc>::from_timestamp_millis(self.status_changed_at)
            .ok_or_else(|| DbError::Serialization("status_changed_at out of range".into()))?;

        Ok(Token {
            token,
            seq: self.seq,
            department_id: DepartmentId(self.department_id),
            patient_id: self.patient_id,
            date,
            status: self.status,
            status_changed_at,
            created_at: parse_naive("created_at", &self.created_at)?,
            expires_at: parse_naive("expires_at", &self.expires_at)?,
        })
    }
}

fn into_tokens(records: Vec<TokenRecord>) -> Result<Vec<Token>, DbError> {
    records.into_iter().map(TokenRecord::into_token).collect()
}

#[derive(Deserialize)]
struct SeqRow {
    seq: u32,
}

impl TokenRepository {
    /// Insert a new token.
    ///
    /// Fails if the (department, date, seq) triple is already taken.
    pub async fn create(token: &Token) -> Result<Token, DbError> {
        with_timeout(async {
            let db = get_db()?;

            let record: Option<TokenRecord> = db
                .create(("patient_tokens", token.token.to_string()))
                .content(TokenRecord::from_token(token))
                .await?;

            record
                .ok_or_else(|| DbError::Query("Failed to create token".into()))?
                .into_token()
        })
        .await
    }

    /// Get a token by its external token string.
    pub async fn get(id: TokenId) -> Result<Token, DbError> {
        with_timeout(async {
            let db = get_db()?;

            let record: Option<TokenRecord> = db.select(("patient_tokens", id.to_string())).await?;

            record
                .ok_or_else(|| DbError::NotFound(format!("Token not found: {}", id)))?
                .into_token()
        })
        .await
    }

    /// Next free daily sequence number for a department.
    pub async fn next_seq(department_id: DepartmentId, date: NaiveDate) -> Result<u32, DbError> {
        with_timeout(async {
            let db = get_db()?;

            let mut result = db
                .query(
                    r#"
                    SELECT seq FROM patient_tokens
                    WHERE queue_day = $queue_day
                    ORDER BY seq DESC
                    LIMIT 1
                    "#,
                )
                .bind(("queue_day", queue_day(department_id, date)))
                .await?;

            let rows: Vec<SeqRow> = result.take(0)?;

            Ok::<_, DbError>(rows.first().map_or(1, |row| row.seq + 1))
        })
        .await
    }

    /// All of a department's tokens for a day, in sequence order.
    pub async fn list_for_day(department_id: DepartmentId, date: NaiveDate) -> Result<Vec<Token>, DbError> {
        with_timeout(async {
            let db = get_db()?;

            let mut result = db
                .query(
                    r#"
                    SELECT * FROM patient_tokens
                    WHERE queue_day = $queue_day
                    ORDER BY seq ASC
                    "#,
                )
                .bind(("queue_day", queue_day(department_id, date)))
                .await?;

            let records: Vec<TokenRecord> = result.take(0)?;

            into_tokens(records)
        })
        .await
    }

    /// A department's tokens for a day that the selector may pick from.
    pub async fn selectable_for_day(
        department_id: DepartmentId,
        date: NaiveDate,
    ) -> Result<Vec<Token>, DbError> {
        with_timeout(async {
            let db = get_db()?;

            let statuses: Vec<String> = TokenStatus::SELECTABLE
                .iter()
                .map(|s| s.as_str().to_string())
                .collect();

            let mut result = db
                .query(
                    r#"
                    SELECT * FROM patient_tokens
                    WHERE queue_day = $queue_day
                      AND status IN $statuses
                    "#,
                )
                .bind(("queue_day", queue_day(department_id, date)))
                .bind(("statuses", statuses))
                .await?;

            let records: Vec<TokenRecord> = result.take(0)?;

            into_tokens(records)
        })
        .await
    }

    /// Update a token's status and stamp the change time.
    pub async fn update_status(
        id: TokenId,
        status: TokenStatus,
        changed_at: DateTime<Utc>,
    ) -> Result<Token, DbError> {
        with_timeout(async {
            let db = get_db()?;

            let mut result = db
                .query(
                    "UPDATE type::thing('patient_tokens', $id) SET status = $status, status_changed_at = $changed_at RETURN AFTER",
                )
                .bind(("id", id.to_string()))
                .bind(("status", status.as_str()))
                .bind(("changed_at", changed_at.timestamp_millis()))
                .await?;

            let records: Vec<TokenRecord> = result.take(0)?;

            records
                .into_iter()
                .next()
                .ok_or_else(|| DbError::NotFound(format!("Token not found: {}", id)))?
                .into_token()
        })
        .await
    }
}
