#![allow(dead_code)]

use std::future::Future;
use std::sync::{LazyLock, Mutex, PoisonError};

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use tokio::runtime::Runtime;

use actors::{ActorError, BroadcastError, Broadcaster, ensure_supervisor};
use db::DbConfig;
use db::repositories::{DepartmentRepository, PatientRepository, TokenRepository};
use queue_core::{Department, DepartmentId, Patient, QueueEvent, Token, TokenStatus};

/// One runtime for every test so the store and the actors outlive each test.
static RUNTIME: LazyLock<Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build test runtime")
});

static TEST_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Run a test body on the shared runtime, one test at a time.
pub fn run<F: Future>(test: F) -> F::Output {
    let _guard = TEST_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    RUNTIME.block_on(test)
}

/// Fresh store with two departments and a running supervisor.
pub async fn setup() -> Result<(), ActorError> {
    db::init(DbConfig::memory()).await?;
    let db_conn = db::get_db()?;
    db_conn
        .query("REMOVE TABLE IF EXISTS current_token; REMOVE TABLE IF EXISTS patient_tokens; REMOVE TABLE IF EXISTS patients; REMOVE TABLE IF EXISTS specializations;")
        .await
        .map_err(db::DbError::from)?
        .check()
        .map_err(db::DbError::from)?;
    db::init_schema().await?;

    DepartmentRepository::seed(&[
        Department::new(DepartmentId(1), "General Medicine"),
        Department::new(DepartmentId(2), "Cardiology"),
    ])
    .await?;

    ensure_supervisor().await?;
    Ok(())
}

/// Today at the given wall-clock time.
pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
    Local::now()
        .date_naive()
        .and_hms_opt(hour, minute, 0)
        .unwrap_or_default()
}

/// UTC instant of today's wall-clock time.
pub fn instant(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.from_utc_datetime(&at(hour, minute))
}

/// Insert a token for today with a given status and status-change time.
pub async fn seed_token(
    department_id: DepartmentId,
    seq: u32,
    name: &str,
    status: TokenStatus,
    changed_at: DateTime<Utc>,
) -> Result<Token, ActorError> {
    let patient_id = format!("P-{}-{}", department_id, seq);
    PatientRepository::upsert(&Patient::from_full_name(patient_id.clone(), name)).await?;

    let token = Token::new(seq, department_id, patient_id, at(9, 0)).with_status(status, changed_at);
    Ok(TokenRepository::create(&token).await?)
}

pub async fn status_of(token: &Token) -> Result<TokenStatus, ActorError> {
    Ok(TokenRepository::get(token.token).await?.status)
}

/// Broadcaster keeping every published event.
#[derive(Default)]
pub struct RecordingBroadcaster {
    events: Mutex<Vec<QueueEvent>>,
}

impl RecordingBroadcaster {
    pub fn events(&self) -> Vec<QueueEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn publish(&self, event: QueueEvent) -> Result<(), BroadcastError> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
        Ok(())
    }
}

/// Broadcaster that rejects everything.
pub struct FailingBroadcaster;

impl Broadcaster for FailingBroadcaster {
    fn publish(&self, _event: QueueEvent) -> Result<(), BroadcastError> {
        Err(BroadcastError::Failed("display offline".into()))
    }
}
