//! Background/foreground reconciliation.
//!
//! While the process is suspended no ticks arrive. On return to the
//! foreground the time spent away is subtracted from the countdown in one
//! step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::engine::{CompletionOutcome, PomodoroTimer};
use super::settings::TimerStatus;

/// Execution state reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppLifecycle {
    Active,
    Background,
}

/// What the caller must do after a lifecycle change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEffect {
    Nothing,
    /// Going to the background while running: write the snapshot now, the
    /// process may be killed.
    PersistSnapshot,
    /// Back in the foreground, still running.
    Resumed { elapsed_secs: u64 },
    /// Back in the foreground and the interval ran out while away.
    Completed(CompletionOutcome),
}

/// Whole seconds from `from` to `to`, never negative.
pub(crate) fn elapsed_secs(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    u64::try_from((to - from).num_seconds()).unwrap_or(0)
}

impl PomodoroTimer {
    pub fn on_lifecycle(&mut self, next: AppLifecycle) -> LifecycleEffect {
        self.on_lifecycle_at(next, Utc::now())
    }

    pub fn on_lifecycle_at(&mut self, next: AppLifecycle, now: DateTime<Utc>) -> LifecycleEffect {
        match next {
            AppLifecycle::Background => {
                if self.status != TimerStatus::Running {
                    return LifecycleEffect::Nothing;
                }
                self.suspended_at = Some(now);
                debug!(remaining = self.remaining_secs, "suspended while running");
                LifecycleEffect::PersistSnapshot
            }
            AppLifecycle::Active => {
                let Some(suspended_at) = self.suspended_at.take() else {
                    return LifecycleEffect::Nothing;
                };
                if self.status != TimerStatus::Running {
                    return LifecycleEffect::Nothing;
                }
                let elapsed = elapsed_secs(suspended_at, now);
                self.remaining_secs = self.remaining_secs.saturating_sub(elapsed);
                debug!(elapsed, remaining = self.remaining_secs, "reconciled background time");
                if self.remaining_secs == 0 {
                    if let Some(outcome) = self.complete_at(now) {
                        return LifecycleEffect::Completed(outcome);
                    }
                }
                LifecycleEffect::Resumed {
                    elapsed_secs: elapsed,
                }
            }
        }
    }
}
