//! # Pomofocus Core Library
//!
//! Business logic for the Pomofocus timer: a Pomodoro countdown bound to a
//! task, which records every completed focus interval as a session so the
//! statistics views can aggregate it.
//!
//! ## Architecture
//!
//! - **Timer**: A synchronous state machine. The caller drives it with
//!   one-second `tick()`s and lifecycle notifications; every transition
//!   returns an [`Event`].
//! - **Service**: [`TimerService`] owns a timer on a tokio task and runs the
//!   countdown, the session recording and snapshot persistence.
//! - **Storage**: SQLite for tasks, sessions and the timer snapshot; TOML for
//!   configuration.
//! - **Api**: HTTP client for the Pomofocus backend, used instead of local
//!   storage when `api.base_url` is configured.
//!
//! ## Key Components
//!
//! - [`PomodoroTimer`]: Core timer state machine
//! - [`Database`]: Local tasks, sessions and statistics
//! - [`Config`]: Application configuration management
//! - [`ApiClient`]: Remote tasks, sessions and statistics

pub mod api;
pub mod credentials;
pub mod error;
pub mod events;
pub mod models;
pub mod service;
pub mod storage;
pub mod timer;
pub mod traits;

pub use api::ApiClient;
pub use error::{ApiError, ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use models::{AuthSession, DailyStats, NewSession, PomodoroSession, Task, TaskStats, User};
pub use service::{Command, TimerService};
pub use storage::{ApiConfig, Config, ConfigStore, Database};
pub use timer::{
    AppLifecycle, CompletionOutcome, LifecycleEffect, PomodoroTimer, SessionNotice, TimerMode,
    TimerSettings, TimerSnapshot, TimerStatus, TimerView,
};
pub use traits::{SessionRecorder, SettingsStore, SnapshotStore, TaskProvider};
