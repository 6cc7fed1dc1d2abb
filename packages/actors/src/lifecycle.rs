//! Token lifecycle operations for one department.
//!
//! These functions re-read every piece of state they act on and must only be
//! called from the department's actor, which runs them one at a time.
//! None of them publish anything; they return the events to publish once the
//! actor has replied.

use chrono::{DateTime, Local, NaiveDate, Utc};
use db::DbError;
use db::repositories::{
    CurrentTokenRepository, DepartmentRepository, PatientRepository, TokenRepository,
};
use queue_core::{
    CurrentView, DepartmentId, DisplayUpdate, QueueEvent, Registration, Token, TokenId,
    TokenStatus, select_next,
};

use crate::messages::ActorResult;

/// A token that became the department's current token.
#[derive(Debug, Clone, PartialEq)]
pub struct Served {
    /// The token with its status after promotion.
    pub token: Token,
    /// Patient display name.
    pub name: String,
    /// Department display name.
    pub department: String,
}

/// Result of call-next or move-next.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub department_id: DepartmentId,
    /// The new current token, `None` when nothing was eligible.
    pub served: Option<Served>,
    /// Display events to publish, in order.
    pub events: Vec<QueueEvent>,
}

/// Result of a registration.
#[derive(Debug, Clone)]
pub struct Registered {
    pub token: Token,
    pub events: Vec<QueueEvent>,
}

/// Result of a re-announcement.
#[derive(Debug, Clone)]
pub struct Announcement {
    pub current: Option<CurrentView>,
    pub events: Vec<QueueEvent>,
}

/// The queue day tokens are selected from.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Complete the current token unconditionally, then serve the next one.
pub async fn call_next(department_id: DepartmentId) -> ActorResult<Outcome> {
    let department = DepartmentRepository::name_of(department_id).await?;
    let now = Utc::now();

    match CurrentTokenRepository::get(department_id).await? {
        Some(current) => {
            match TokenRepository::update_status(current.token, TokenStatus::Completed, now).await {
                Ok(_) => tracing::info!(
                    "Department {}: token {} completed",
                    department_id,
                    current.seq
                ),
                Err(DbError::NotFound(_)) => tracing::warn!(
                    "Department {}: current token {} no longer exists",
                    department_id,
                    current.token
                ),
                Err(e) => return Err(e.into()),
            }
        }
        None => tracing::debug!("Department {}: no token to complete", department_id),
    }

    let served = serve_next(department_id, &department, None, now).await?;
    let events = vec![display_event(department_id, served.as_ref())];

    Ok(Outcome {
        department_id,
        served,
        events,
    })
}

/// Move the current token one step along `consulting -> recall -> hold ->
/// no_show`, then serve the next eligible token other than it.
pub async fn move_next(department_id: DepartmentId) -> ActorResult<Outcome> {
    let department = DepartmentRepository::name_of(department_id).await?;
    let now = Utc::now();
    let mut events = Vec::new();
    let mut moved: Option<TokenId> = None;

    if let Some(current) = CurrentTokenRepository::get(department_id).await? {
        match TokenRepository::get(current.token).await {
            Ok(token) => {
                let target = match token.status.on_move() {
                    Some(target) => target,
                    None => {
                        tracing::warn!(
                            "Department {}: current token {} has unexpected status '{}' on move-next, falling back to recall",
                            department_id,
                            token.seq,
                            token.status
                        );
                        TokenStatus::Recall
                    }
                };

                let name = PatientRepository::display_name(&token.patient_id).await?;
                TokenRepository::update_status(token.token, target, now).await?;
                tracing::info!(
                    "Department {}: token {} moved {} -> {}",
                    department_id,
                    token.seq,
                    token.status,
                    target
                );

                events.push(QueueEvent::UpdateToken(DisplayUpdate::showing(
                    token.seq,
                    name,
                    department_id,
                    target,
                )));
                moved = Some(token.token);
            }
            Err(DbError::NotFound(_)) => tracing::warn!(
                "Department {}: current token {} no longer exists",
                department_id,
                current.token
            ),
            Err(e) => return Err(e.into()),
        }
    }

    let served = serve_next(department_id, &department, moved, now).await?;
    events.push(display_event(department_id, served.as_ref()));

    Ok(Outcome {
        department_id,
        served,
        events,
    })
}

/// Select the next token, promote it if it was waiting, and point the
/// department at it. Leaves the current token untouched when nothing is
/// eligible.
async fn serve_next(
    department_id: DepartmentId,
    department: &str,
    exclude: Option<TokenId>,
    now: DateTime<Utc>,
) -> ActorResult<Option<Served>> {
    let today = today();
    let candidates = TokenRepository::selectable_for_day(department_id, today).await?;

    let Some(next) = select_next(&candidates, today, exclude).cloned() else {
        tracing::info!("Department {}: no eligible tokens", department_id);
        return Ok(None);
    };

    let name = PatientRepository::display_name(&next.patient_id).await?;

    let status = next.status.on_call();
    let change = (status != next.status).then_some(status);
    CurrentTokenRepository::point_to(&next, change, now).await?;

    tracing::info!(
        "Department {}: now showing token {} ({})",
        department_id,
        next.seq,
        status
    );

    let token = match change {
        Some(status) => next.with_status(status, now),
        None => next,
    };

    Ok(Some(Served {
        token,
        name,
        department: department.to_string(),
    }))
}

fn display_event(department_id: DepartmentId, served: Option<&Served>) -> QueueEvent {
    let update = match served {
        Some(served) => DisplayUpdate::showing(
            served.token.seq,
            served.name.clone(),
            department_id,
            served.token.status,
        ),
        None => DisplayUpdate::cleared(department_id),
    };
    QueueEvent::UpdateToken(update)
}

/// Register a patient and append a waiting token to the visit day's queue.
pub async fn register(registration: Registration) -> ActorResult<Registered> {
    let department_id = registration.department_id;
    let date = registration.visit_time.date();

    PatientRepository::upsert(&registration.patient).await?;

    let seq = TokenRepository::next_seq(department_id, date).await?;
    let token = TokenRepository::create(&Token::new(
        seq,
        department_id,
        registration.patient.patient_id.clone(),
        registration.visit_time,
    ))
    .await?;

    tracing::info!(
        "Department {}: registered token {} for {} on {}",
        department_id,
        token.seq,
        token.patient_id,
        token.date
    );

    Ok(Registered {
        events: vec![QueueEvent::TokenRegistered(token.clone())],
        token,
    })
}

/// Read the current token with its patient name and status.
pub async fn current(department_id: DepartmentId) -> ActorResult<Option<CurrentView>> {
    let Some(current) = CurrentTokenRepository::get(department_id).await? else {
        return Ok(None);
    };

    let name = PatientRepository::display_name(&current.patient_id).await?;
    let status = match TokenRepository::get(current.token).await {
        Ok(token) => Some(token.status),
        Err(DbError::NotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };

    Ok(Some(CurrentView {
        current,
        name,
        status,
    }))
}

/// Re-publish the current token without changing anything.
pub async fn announce(department_id: DepartmentId) -> ActorResult<Announcement> {
    let current = current(department_id).await?;

    let events = current
        .iter()
        .map(|view| {
            QueueEvent::UpdateToken(DisplayUpdate::announce(
                view.current.seq,
                view.name.clone(),
                department_id,
            ))
        })
        .collect();

    Ok(Announcement { current, events })
}
