pub mod auth;
pub mod config;
pub mod stats;
pub mod task;
pub mod timer;

use std::future::Future;

use pomofocus_core::{
    credentials, ApiClient, ConfigStore, CoreError, Database, NewSession, PomodoroSession,
    SessionRecorder, Task, TaskProvider,
};
use tracing::{debug, warn};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Where tasks and sessions live: the backend when `api.base_url` is set,
/// the local database otherwise.
pub enum Backend {
    Remote(ApiClient),
    Local(Database),
}

impl Backend {
    pub fn open() -> Result<Self, CoreError> {
        let config = ConfigStore::open()?.load_or_default();
        if config.api.base_url.is_none() {
            debug!("no api.base_url configured, using local storage");
            return Ok(Backend::Local(Database::open()?));
        }
        let token = credentials::load_token().unwrap_or_else(|e| {
            warn!(error = %e, "could not read stored token");
            None
        });
        Ok(Backend::Remote(ApiClient::from_config(&config.api)?.with_token(token)))
    }
}

impl SessionRecorder for Backend {
    async fn record(&self, session: NewSession) -> pomofocus_core::error::Result<PomodoroSession> {
        match self {
            Backend::Remote(client) => client.record(session).await,
            Backend::Local(db) => db.record(session).await,
        }
    }
}

impl TaskProvider for Backend {
    async fn list(&self) -> pomofocus_core::error::Result<Vec<Task>> {
        match self {
            Backend::Remote(client) => client.list().await,
            Backend::Local(db) => db.list().await,
        }
    }
}

/// Run a future to completion on a fresh current-thread runtime.
pub fn block_on<F: Future>(fut: F) -> Result<F::Output, std::io::Error> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(rt.block_on(fut))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
