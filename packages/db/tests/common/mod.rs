use std::future::Future;
use std::sync::{LazyLock, Mutex, PoisonError};

use tokio::runtime::Runtime;

use db::{DbConfig, DbError};

/// One runtime for every test so the in-memory engine outlives each test.
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

pub async fn setup_db() -> Result<(), DbError> {
    db::init(DbConfig::memory()).await?;
    let db_conn = db::get_db()?;
    // Drop and recreate tables so no row or index entry survives a test.
    db_conn
        .query("REMOVE TABLE IF EXISTS current_token; REMOVE TABLE IF EXISTS patient_tokens; REMOVE TABLE IF EXISTS patients; REMOVE TABLE IF EXISTS specializations;")
        .await?
        .check()?;
    db::init_schema().await?;
    Ok(())
}
