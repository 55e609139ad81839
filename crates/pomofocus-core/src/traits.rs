//! Seams between the timer core and the things it talks to.
//!
//! Local stores are synchronous and absorb their own failures; the session
//! recorder and the task provider may go over the network and report errors
//! to the caller.

use std::future::Future;

use crate::error::Result;
use crate::models::{NewSession, PomodoroSession, Task};
use crate::timer::{TimerSettings, TimerSnapshot};

pub trait SettingsStore {
    /// Stored settings, or defaults when absent or unreadable.
    fn get(&self) -> TimerSettings;

    /// Persist settings. Failures are logged, never returned.
    fn set(&self, settings: &TimerSettings);
}

pub trait SnapshotStore {
    fn load(&self) -> Option<TimerSnapshot>;

    /// Persist the snapshot. Failures are logged, never returned; the timer
    /// keeps running in memory.
    fn save(&self, snapshot: &TimerSnapshot);
}

/// Stores completed focus sessions for statistics.
pub trait SessionRecorder {
    fn record(&self, session: NewSession) -> impl Future<Output = Result<PomodoroSession>>;
}

/// Source of tasks the user can bind a focus session to.
pub trait TaskProvider {
    fn list(&self) -> impl Future<Output = Result<Vec<Task>>>;
}
