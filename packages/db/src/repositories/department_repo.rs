//! Department repository for the `specializations` table.

use queue_core::{Department, DepartmentId};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use crate::{DbError, get_db, with_timeout};

/// Repository for department reference data.
pub struct DepartmentRepository;

/// Internal record type for SurrealDB.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DepartmentRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Thing>,
    specialization_id: i64,
    name: String,
}

impl DepartmentRecord {
    fn into_department(self) -> Department {
        Department::new(DepartmentId(self.specialization_id), self.name)
    }
}

impl DepartmentRepository {
    /// Create a department.
    pub async fn create(department: &Department) -> Result<Department, DbError> {
        with_timeout(async {
            let db = get_db()?;

            let record: Option<DepartmentRecord> = db
                .create(("specializations", department.id.0))
                .content(DepartmentRecord {
                    id: None,
                    specialization_id: department.id.0,
                    name: department.name.clone(),
                })
                .await?;

            record
                .map(DepartmentRecord::into_department)
                .ok_or_else(|| DbError::Query("Failed to create department".into()))
        })
        .await
    }

    /// Get a department by ID.
    pub async fn get(id: DepartmentId) -> Result<Department, DbError> {
        with_timeout(async {
            let db = get_db()?;

            let record: Option<DepartmentRecord> = db.select(("specializations", id.0)).await?;

            record
                .map(DepartmentRecord::into_department)
                .ok_or_else(|| DbError::NotFound(format!("Department not found: {}", id)))
        })
        .await
    }

    /// Get a department's display name, or "Unknown" if it is not on record.
    pub async fn name_of(id: DepartmentId) -> Result<String, DbError> {
        match Self::get(id).await {
            Ok(department) => Ok(department.name),
            Err(DbError::NotFound(_)) => Ok("Unknown".to_string()),
            Err(e) => Err(e),
        }
    }

    /// List all departments ordered by ID.
    pub async fn list() -> Result<Vec<Department>, DbError> {
        with_timeout(async {
            let db = get_db()?;

            let mut result = db
                .query("SELECT * FROM specializations ORDER BY specialization_id ASC")
                .await?;

            let records: Vec<DepartmentRecord> = result.take(0)?;

            Ok::<_, DbError>(records.into_iter().map(DepartmentRecord::into_department).collect())
        })
        .await
    }

    /// Insert the given departments if the table is empty.
    ///
    /// Returns the number of departments created.
    pub async fn seed(departments: &[Department]) -> Result<usize, DbError> {
        if !Self::list().await?.is_empty() {
            return Ok(0);
        }

        for department in departments {
            Self::create(department).await?;
        }

        if !departments.is_empty() {
            tracing::info!("Seeded {} departments", departments.len());
        }

        Ok(departments.len())
    }
}
