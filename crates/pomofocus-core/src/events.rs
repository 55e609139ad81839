use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::PomodoroSession;
use crate::timer::{TimerMode, TimerSettings, TimerView};

/// Every state change in the timer produces an Event.
/// The CLI prints them; the timer service forwards them to its subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        task_id: Option<String>,
        duration_secs: u64,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: TimerMode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    BreakSkipped {
        from: TimerMode,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        mode: TimerMode,
        next_mode: TimerMode,
        sessions_completed: u32,
        at: DateTime<Utc>,
    },
    /// A focus session reached the recorder and was stored.
    SessionRecorded {
        session: PomodoroSession,
        at: DateTime<Utc>,
    },
    /// A focus session completed but was not stored. Shown to the user once.
    SessionNotSaved {
        reason: String,
        at: DateTime<Utc>,
    },
    /// Time spent suspended was subtracted from the running countdown.
    BackgroundReconciled {
        elapsed_secs: u64,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// A user command was refused, e.g. starting focus without a task.
    CommandRejected {
        command: String,
        reason: String,
        at: DateTime<Utc>,
    },
    TaskSelected {
        task_id: Option<String>,
        at: DateTime<Utc>,
    },
    SettingsChanged {
        settings: TimerSettings,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        view: TimerView,
        at: DateTime<Utc>,
    },
}
