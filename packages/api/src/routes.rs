//! JSON endpoints for desks, doctors and displays.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use actors::{Outcome, lifecycle};
use db::repositories::{DepartmentRepository, TokenRepository};
use queue_core::{DepartmentId, RegistrationRequest, Token, TokenStatus, ValidationError};

use crate::error::ApiError;
use crate::state::AppState;

/// Body of the department-scoped POST endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct DepartmentBody {
    #[serde(default)]
    pub department_id: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DepartmentQuery {
    #[serde(default)]
    pub department_id: Option<String>,
}

/// Validate a department id taken from a query string or path.
pub fn department_param(raw: Option<String>) -> Result<DepartmentId, ValidationError> {
    DepartmentId::from_json(raw.map(Value::String).as_ref())
}

fn department_body(body: Result<Json<DepartmentBody>, JsonRejection>) -> Result<DepartmentId, ValidationError> {
    // An unreadable body carries no department.
    let body = body.map(|Json(body)| body).unwrap_or_default();
    DepartmentId::from_json(body.department_id.as_ref())
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
}

/// `GET /`
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "API running",
    })
}

/// Response of call-next and move-next.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ServedResponse {
    Token {
        token: u32,
        name: String,
        department: String,
    },
    Empty {
        message: &'static str,
    },
}

impl From<Outcome> for ServedResponse {
    fn from(outcome: Outcome) -> Self {
        match outcome.served {
            Some(served) => ServedResponse::Token {
                token: served.token.seq,
                name: served.name,
                department: served.department,
            },
            None => ServedResponse::Empty {
                message: "No more tokens",
            },
        }
    }
}

/// `POST /api/call-next`
pub async fn call_next(
    State(state): State<AppState>,
    body: Result<Json<DepartmentBody>, JsonRejection>,
) -> Result<Json<ServedResponse>, ApiError> {
    let department_id = department_body(body)?;
    let outcome = state.service.call_next(department_id).await?;
    Ok(Json(outcome.into()))
}

/// `POST /api/move-next`
pub async fn move_next(
    State(state): State<AppState>,
    body: Result<Json<DepartmentBody>, JsonRejection>,
) -> Result<Json<ServedResponse>, ApiError> {
    let department_id = department_body(body)?;
    let outcome = state.service.move_next(department_id).await?;
    Ok(Json(outcome.into()))
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CurrentResponse {
    Token {
        token: u32,
        name: String,
        department: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<TokenStatus>,
    },
    Empty {
        message: &'static str,
    },
}

/// `GET /api/current-token?department_id=`
pub async fn current_token(
    State(state): State<AppState>,
    Query(query): Query<DepartmentQuery>,
) -> Result<Json<CurrentResponse>, ApiError> {
    let department_id = department_param(query.department_id)?;

    let response = match state.service.current(department_id).await? {
        Some(view) => CurrentResponse::Token {
            token: view.current.seq,
            name: view.name,
            department: DepartmentRepository::name_of(department_id).await?,
            status: view.status,
        },
        None => CurrentResponse::Empty {
            message: "No current token",
        },
    };

    Ok(Json(response))
}

#[derive(Debug, Serialize)]
pub struct AnnounceResponse {
    pub success: bool,
    pub message: &'static str,
}

/// `POST /api/announce-current`
pub async fn announce_current(
    State(state): State<AppState>,
    body: Result<Json<DepartmentBody>, JsonRejection>,
) -> Result<Json<AnnounceResponse>, ApiError> {
    let department_id = department_body(body)?;
    let announcement = state.service.announce(department_id).await?;

    let response = if announcement.current.is_some() {
        AnnounceResponse {
            success: true,
            message: "Announcement repeated",
        }
    } else {
        AnnounceResponse {
            success: false,
            message: "No current token",
        }
    };

    Ok(Json(response))
}

#[derive(Debug, Serialize)]
pub struct DepartmentEntry {
    pub id: DepartmentId,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct DepartmentsResponse {
    pub departments: Vec<DepartmentEntry>,
}

/// `GET /api/departments`
pub async fn departments() -> Result<Json<DepartmentsResponse>, ApiError> {
    let departments = DepartmentRepository::list()
        .await?
        .into_iter()
        .map(|d| DepartmentEntry {
            id: d.id,
            name: d.name,
        })
        .collect();

    Ok(Json(DepartmentsResponse { departments }))
}

#[derive(Debug, Serialize)]
pub struct RegisteredPatient {
    pub patient_id: String,
    pub department_id: DepartmentId,
    pub datetime: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub token: String,
    pub daily_id: u32,
    pub verify_url: String,
    pub patient: RegisteredPatient,
}

fn verify_url(state: &AppState, headers: &HeaderMap, patient_id: &str) -> String {
    let base = match &state.public_url {
        Some(url) => url.trim_end_matches('/').to_string(),
        None => {
            let host = headers
                .get(header::HOST)
                .and_then(|h| h.to_str().ok())
                .unwrap_or("localhost");
            format!("http://{}", host)
        }
    };
    format!("{}/patient-info?upid={}", base, patient_id)
}

/// `POST /register`
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<RegistrationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let registration = request.validate()?;
    let date_time = registration.date_time.clone();

    let registered = state.service.register(registration).await?;
    let token = registered.token;

    let response = RegisterResponse {
        message: "Patient registered successfully",
        token: token.token.to_string(),
        daily_id: token.seq,
        verify_url: verify_url(&state, &headers, &token.patient_id),
        patient: RegisteredPatient {
            patient_id: token.patient_id,
            department_id: token.department_id,
            datetime: date_time,
        },
    };

    Ok((StatusCode::CREATED, Json(response)))
}

#[derive(Debug, Serialize)]
pub struct QueueEntry {
    pub id: u32,
    pub token: String,
    pub patient_id: String,
    pub datetime: String,
    pub status: TokenStatus,
    pub status_updated_at: String,
}

impl From<Token> for QueueEntry {
    fn from(token: Token) -> Self {
        Self {
            id: token.seq,
            token: token.token.to_string(),
            patient_id: token.patient_id,
            datetime: token.created_at.format("%Y-%m-%d %H:%M").to_string(),
            status: token.status,
            status_updated_at: token
                .status_changed_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QueueResponse {
    pub department_id: DepartmentId,
    pub date: String,
    pub queue: Vec<QueueEntry>,
}

/// `GET /queue/{department_id}`: today's tokens in sequence order.
pub async fn department_queue(Path(raw): Path<String>) -> Result<Json<QueueResponse>, ApiError> {
    let department_id = department_param(Some(raw))?;
    let today: NaiveDate = lifecycle::today();

    let queue = TokenRepository::list_for_day(department_id, today)
        .await?
        .into_iter()
        .map(QueueEntry::from)
        .collect();

    Ok(Json(QueueResponse {
        department_id,
        date: today.format("%Y-%m-%d").to_string(),
        queue,
    }))
}
