//! Durable timer snapshot and cold-start restore.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::engine::{CompletionOutcome, PomodoroTimer};
use super::lifecycle::elapsed_secs;
use super::settings::{TimerMode, TimerSettings, TimerStatus};

/// Serialized timer state, written on every status change and on
/// backgrounding, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    #[serde(default)]
    pub selected_task_id: Option<String>,
    pub mode: TimerMode,
    pub status: TimerStatus,
    #[serde(rename = "timeRemaining")]
    pub time_remaining_secs: u64,
    #[serde(rename = "totalTime")]
    pub total_time_secs: u64,
    #[serde(default)]
    pub sessions_completed: u32,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// When `time_remaining_secs` was captured. Older snapshots lack it, in
    /// which case the start time is the reference.
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl PomodoroTimer {
    pub fn snapshot(&self) -> TimerSnapshot {
        self.snapshot_at(Utc::now())
    }

    pub fn snapshot_at(&self, now: DateTime<Utc>) -> TimerSnapshot {
        TimerSnapshot {
            selected_task_id: self.selected_task_id.clone(),
            mode: self.mode,
            status: self.status,
            time_remaining_secs: self.remaining_secs,
            total_time_secs: self.total_secs,
            sessions_completed: self.sessions_completed,
            start_time: self.start_time,
            saved_at: Some(now),
        }
    }

    pub fn restore(
        snapshot: TimerSnapshot,
        settings: TimerSettings,
    ) -> (Self, Option<CompletionOutcome>) {
        Self::restore_at(snapshot, settings, Utc::now())
    }

    /// Rebuild the timer at process start. A snapshot taken while running is
    /// advanced by the wall-clock time since it was written; if that runs the
    /// interval out, completion happens here and its outcome is returned.
    pub fn restore_at(
        snapshot: TimerSnapshot,
        settings: TimerSettings,
        now: DateTime<Utc>,
    ) -> (Self, Option<CompletionOutcome>) {
        let mut timer = PomodoroTimer::new(settings);
        timer.mode = snapshot.mode;
        timer.sessions_completed = snapshot.sessions_completed;
        timer.selected_task_id = snapshot.selected_task_id;

        if snapshot.total_time_secs == 0 {
            warn!("snapshot has an empty interval, using configured duration");
            timer.total_secs = settings.duration_secs(snapshot.mode);
            timer.remaining_secs = timer.total_secs;
        } else {
            timer.total_secs = snapshot.total_time_secs;
            timer.remaining_secs = snapshot.time_remaining_secs.min(snapshot.total_time_secs);
        }

        match (snapshot.status, snapshot.start_time) {
            (TimerStatus::Running, Some(start_time)) => {
                let anchor = snapshot.saved_at.unwrap_or(start_time);
                let elapsed = elapsed_secs(anchor, now);
                timer.status = TimerStatus::Running;
                timer.start_time = Some(start_time);
                timer.remaining_secs = timer.remaining_secs.saturating_sub(elapsed);
                debug!(elapsed, remaining = timer.remaining_secs, "restored running timer");
                if timer.remaining_secs == 0 {
                    let outcome = timer.complete_at(now);
                    return (timer, outcome);
                }
            }
            (TimerStatus::Running, None) => {
                warn!("running snapshot without start time, restoring as paused");
                timer.status = TimerStatus::Paused;
            }
            (status, _) => {
                timer.status = status;
            }
        }
        (timer, None)
    }
}
