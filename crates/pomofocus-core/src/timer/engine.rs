//! Pomodoro timer state machine.
//!
//! The timer owns no threads and no clock. The caller drives it: `tick()`
//! once per second while running, lifecycle notifications when the process
//! is suspended or resumed, and user commands. Every transition has an
//! `*_at(now)` form so callers and tests can supply the wall-clock instant.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Running --pause--> Paused --resume--> Running
//!   ^                |                  |
//!   +----complete----+------reset-------+
//! ```
//!
//! Completion moves Focus -> Break/LongBreak and any break -> Focus, always
//! landing in `Idle`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = PomodoroTimer::new(TimerSettings::default());
//! timer.select_task(Some("task-1".into()));
//! timer.start()?;
//! // Once per second:
//! if let Some(outcome) = timer.tick() {
//!     // hand outcome.session to a recorder, then:
//!     // timer.finish_completion(result);
//! }
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::settings::{TimerMode, TimerSettings, TimerStatus};
use crate::error::{CoreError, ValidationError};
use crate::events::Event;
use crate::models::{NewSession, PomodoroSession};

/// Why a completed focus session did not reach storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "camelCase")]
pub enum NotSavedReason {
    NoTaskSelected,
    MissingStartTime,
    /// The recorder failed. Never retried.
    Recorder(String),
}

impl fmt::Display for NotSavedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotSavedReason::NoTaskSelected => f.write_str(
                "No task was selected for this focus session, so it cannot be saved. \
                 Select a task before starting.",
            ),
            NotSavedReason::MissingStartTime => f.write_str(
                "Could not determine the session start time, so it cannot be saved.",
            ),
            NotSavedReason::Recorder(msg) => write!(
                f,
                "Your focus session could not be saved, so stats will not update: {msg}"
            ),
        }
    }
}

/// What happens to the session of a completed interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionDisposition {
    /// Break intervals record nothing.
    NotApplicable,
    /// Hand this draft to a recorder and report back via
    /// [`PomodoroTimer::finish_completion`]. The completion latch is held
    /// until then.
    Pending(NewSession),
    NotSaved(NotSavedReason),
}

/// Result of a completion, returned once per expiring interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOutcome {
    pub completed_mode: TimerMode,
    pub next_mode: TimerMode,
    pub sessions_completed: u32,
    pub session: SessionDisposition,
    pub at: DateTime<Utc>,
}

impl CompletionOutcome {
    pub fn event(&self) -> Event {
        Event::TimerCompleted {
            mode: self.completed_mode,
            next_mode: self.next_mode,
            sessions_completed: self.sessions_completed,
            at: self.at,
        }
    }

    /// The draft to record, if any.
    pub fn pending_session(&self) -> Option<&NewSession> {
        match &self.session {
            SessionDisposition::Pending(draft) => Some(draft),
            _ => None,
        }
    }

    /// The notice to show right away for sessions that were never sent.
    pub fn immediate_notice(&self) -> Option<SessionNotice> {
        match &self.session {
            SessionDisposition::NotSaved(reason) => Some(SessionNotice::NotSaved(reason.clone())),
            _ => None,
        }
    }
}

/// User-visible result of recording a focus session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    Saved(PomodoroSession),
    NotSaved(NotSavedReason),
}

impl SessionNotice {
    pub fn event(&self, at: DateTime<Utc>) -> Event {
        match self {
            SessionNotice::Saved(session) => Event::SessionRecorded {
                session: session.clone(),
                at,
            },
            SessionNotice::NotSaved(reason) => Event::SessionNotSaved {
                reason: reason.to_string(),
                at,
            },
        }
    }
}

/// Read-only view for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerView {
    pub mode: TimerMode,
    pub status: TimerStatus,
    pub remaining_secs: u64,
    pub total_secs: u64,
    pub sessions_completed: u32,
    pub selected_task_id: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    /// 0.0 .. 1.0 progress within the current interval.
    pub progress: f64,
    /// `mm:ss`
    pub display: String,
}

/// Core timer state machine.
#[derive(Debug, Clone)]
pub struct PomodoroTimer {
    pub(super) settings: TimerSettings,
    pub(super) mode: TimerMode,
    pub(super) status: TimerStatus,
    pub(super) remaining_secs: u64,
    pub(super) total_secs: u64,
    pub(super) sessions_completed: u32,
    pub(super) selected_task_id: Option<String>,
    /// Set iff `status == Running`. Reset on resume.
    pub(super) start_time: Option<DateTime<Utc>>,
    /// When the process was last backgrounded while running.
    pub(super) suspended_at: Option<DateTime<Utc>>,
    /// Held from completion until the session recording result is reported.
    completing: bool,
}

impl PomodoroTimer {
    /// A fresh idle focus timer.
    pub fn new(settings: TimerSettings) -> Self {
        let total_secs = settings.duration_secs(TimerMode::Focus);
        Self {
            settings,
            mode: TimerMode::Focus,
            status: TimerStatus::Idle,
            remaining_secs: total_secs,
            total_secs,
            sessions_completed: 0,
            selected_task_id: None,
            start_time: None,
            suspended_at: None,
            completing: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn sessions_completed(&self) -> u32 {
        self.sessions_completed
    }

    pub fn selected_task_id(&self) -> Option<&str> {
        self.selected_task_id.as_deref()
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn suspended_at(&self) -> Option<DateTime<Utc>> {
        self.suspended_at
    }

    /// A session recording is in flight.
    pub fn is_completing(&self) -> bool {
        self.completing
    }

    /// Running with nothing left, but completion has not happened yet
    /// (because a previous recording still held the latch).
    pub fn is_expired(&self) -> bool {
        self.status == TimerStatus::Running && self.remaining_secs == 0
    }

    pub fn progress(&self) -> f64 {
        if self.total_secs == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_secs as f64 / self.total_secs as f64)
    }

    pub fn view(&self) -> TimerView {
        TimerView {
            mode: self.mode,
            status: self.status,
            remaining_secs: self.remaining_secs,
            total_secs: self.total_secs,
            sessions_completed: self.sessions_completed,
            selected_task_id: self.selected_task_id.clone(),
            start_time: self.start_time,
            progress: self.progress(),
            display: format_mmss(self.remaining_secs),
        }
    }

    pub fn state_event(&self) -> Event {
        Event::StateSnapshot {
            view: self.view(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Result<Option<Event>, ValidationError> {
        self.start_at(Utc::now())
    }

    /// Valid only from `Idle`. Focus runs need a selected task.
    pub fn start_at(&mut self, now: DateTime<Utc>) -> Result<Option<Event>, ValidationError> {
        if self.status != TimerStatus::Idle {
            return Ok(None);
        }
        if self.mode == TimerMode::Focus && self.selected_task_id.is_none() {
            return Err(ValidationError::TaskRequired);
        }
        self.status = TimerStatus::Running;
        self.start_time = Some(now);
        debug!(mode = %self.mode, remaining = self.remaining_secs, "timer started");
        Ok(Some(Event::TimerStarted {
            mode: self.mode,
            task_id: self.selected_task_id.clone(),
            duration_secs: self.total_secs,
            remaining_secs: self.remaining_secs,
            at: now,
        }))
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.pause_at(Utc::now())
    }

    pub fn pause_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.status != TimerStatus::Running {
            return None;
        }
        self.status = TimerStatus::Paused;
        self.start_time = None;
        self.suspended_at = None;
        debug!(remaining = self.remaining_secs, "timer paused");
        Some(Event::TimerPaused {
            remaining_secs: self.remaining_secs,
            at: now,
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        self.resume_at(Utc::now())
    }

    pub fn resume_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.status != TimerStatus::Paused {
            return None;
        }
        self.status = TimerStatus::Running;
        self.start_time = Some(now);
        debug!(remaining = self.remaining_secs, "timer resumed");
        Some(Event::TimerResumed {
            remaining_secs: self.remaining_secs,
            at: now,
        })
    }

    pub fn reset(&mut self) -> Event {
        self.reset_at(Utc::now())
    }

    /// Valid from any status. Also unbinds the selected task.
    pub fn reset_at(&mut self, now: DateTime<Utc>) -> Event {
        self.selected_task_id = None;
        self.enter_idle(self.mode);
        debug!(mode = %self.mode, "timer reset");
        Event::TimerReset {
            mode: self.mode,
            remaining_secs: self.remaining_secs,
            at: now,
        }
    }

    pub fn skip_break(&mut self) -> Option<Event> {
        self.skip_break_at(Utc::now())
    }

    /// No-op in focus mode. Otherwise jumps to an idle focus interval.
    pub fn skip_break_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if !self.mode.is_break() {
            return None;
        }
        let from = self.mode;
        self.enter_idle(TimerMode::Focus);
        debug!(%from, "break skipped");
        Some(Event::BreakSkipped { from, at: now })
    }

    /// Bind (or clear) the task the next focus interval is recorded against.
    pub fn select_task(&mut self, task_id: Option<String>) -> Event {
        self.selected_task_id = task_id;
        Event::TaskSelected {
            task_id: self.selected_task_id.clone(),
            at: Utc::now(),
        }
    }

    /// Replace the settings. While idle the current interval is resized
    /// immediately; a running or paused countdown is left untouched.
    pub fn update_settings(&mut self, settings: TimerSettings) -> Result<Event, ValidationError> {
        settings.validate()?;
        self.settings = settings;
        if self.status == TimerStatus::Idle {
            self.total_secs = settings.duration_secs(self.mode);
            self.remaining_secs = self.total_secs;
        }
        Ok(Event::SettingsChanged {
            settings,
            at: Utc::now(),
        })
    }

    pub fn tick(&mut self) -> Option<CompletionOutcome> {
        self.tick_at(Utc::now())
    }

    /// One second of countdown. Returns the outcome when the interval ends.
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> Option<CompletionOutcome> {
        if self.status != TimerStatus::Running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            return self.complete_at(now);
        }
        None
    }

    pub fn complete(&mut self) -> Option<CompletionOutcome> {
        self.complete_at(Utc::now())
    }

    /// Finish the running interval. Returns `None` when there is nothing to
    /// complete or another completion still holds the latch, so concurrent
    /// triggers (tick and foreground reconciliation) collapse into one.
    pub fn complete_at(&mut self, now: DateTime<Utc>) -> Option<CompletionOutcome> {
        if self.completing {
            debug!("completion already in progress, ignoring");
            return None;
        }
        if self.status != TimerStatus::Running {
            return None;
        }

        let completed_mode = self.mode;
        let (next_mode, session) = match completed_mode {
            TimerMode::Focus => {
                let session = match (self.selected_task_id.take(), self.start_time) {
                    (None, _) => SessionDisposition::NotSaved(NotSavedReason::NoTaskSelected),
                    (Some(_), None) => {
                        SessionDisposition::NotSaved(NotSavedReason::MissingStartTime)
                    }
                    (Some(task_id), Some(start_time)) => {
                        self.completing = true;
                        SessionDisposition::Pending(NewSession {
                            task_id,
                            start_time,
                            end_time: now,
                            duration_secs: self.total_secs,
                            completed: true,
                        })
                    }
                };
                self.sessions_completed += 1;
                (self.settings.break_after(self.sessions_completed), session)
            }
            TimerMode::Break | TimerMode::LongBreak => {
                (TimerMode::Focus, SessionDisposition::NotApplicable)
            }
        };

        self.enter_idle(next_mode);
        info!(
            completed = %completed_mode,
            next = %next_mode,
            sessions_completed = self.sessions_completed,
            "interval completed"
        );

        Some(CompletionOutcome {
            completed_mode,
            next_mode,
            sessions_completed: self.sessions_completed,
            session,
            at: now,
        })
    }

    /// Report the recorder's result for a pending session and release the
    /// completion latch.
    pub fn finish_completion(
        &mut self,
        result: Result<PomodoroSession, CoreError>,
    ) -> SessionNotice {
        self.completing = false;
        match result {
            Ok(session) => {
                info!(session_id = %session.id, task_id = %session.task_id, "session recorded");
                SessionNotice::Saved(session)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to record session");
                SessionNotice::NotSaved(NotSavedReason::Recorder(e.to_string()))
            }
        }
    }

    /// Release the completion latch without a result (the recording was
    /// dropped, e.g. on teardown).
    pub fn abandon_completion(&mut self) {
        self.completing = false;
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn enter_idle(&mut self, mode: TimerMode) {
        self.mode = mode;
        self.status = TimerStatus::Idle;
        self.total_secs = self.settings.duration_secs(mode);
        self.remaining_secs = self.total_secs;
        self.start_time = None;
        self.suspended_at = None;
    }
}

/// `mm:ss`; minutes are not capped at 59.
pub fn format_mmss(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn settings(focus: u32, brk: u32, long: u32, every: u32) -> TimerSettings {
        TimerSettings {
            focus_duration: focus,
            break_duration: brk,
            long_break_duration: long,
            sessions_until_long_break: every,
        }
    }

    fn focused_timer() -> PomodoroTimer {
        let mut timer = PomodoroTimer::new(TimerSettings::default());
        timer.select_task(Some("t1".into()));
        timer
    }

    fn run_out(timer: &mut PomodoroTimer, now: DateTime<Utc>) -> CompletionOutcome {
        let mut at = now;
        loop {
            at += Duration::seconds(1);
            if let Some(outcome) = timer.tick_at(at) {
                return outcome;
            }
            assert_eq!(timer.status(), TimerStatus::Running, "timer stopped without completing");
        }
    }

    fn stored(draft: &NewSession) -> PomodoroSession {
        PomodoroSession {
            id: "s1".into(),
            task_id: draft.task_id.clone(),
            user_id: None,
            start_time: draft.start_time,
            end_time: draft.end_time,
            duration_secs: draft.duration_secs,
            completed: draft.completed,
        }
    }

    #[test]
    fn start_pause_resume() {
        let mut timer = focused_timer();
        assert_eq!(timer.status(), TimerStatus::Idle);

        assert!(timer.start().unwrap().is_some());
        assert_eq!(timer.status(), TimerStatus::Running);
        assert!(timer.start_time().is_some());

        assert!(timer.pause().is_some());
        assert_eq!(timer.status(), TimerStatus::Paused);
        assert!(timer.start_time().is_none());

        assert!(timer.resume().is_some());
        assert_eq!(timer.status(), TimerStatus::Running);
        assert!(timer.start_time().is_some());
    }

    #[test]
    fn invalid_transitions_are_no_ops() {
        let mut timer = focused_timer();
        assert!(timer.pause().is_none());
        assert!(timer.resume().is_none());
        timer.start().unwrap();
        assert_eq!(timer.start().unwrap(), None);
        assert!(timer.resume().is_none());
    }

    #[test]
    fn focus_start_without_task_is_rejected() {
        let mut timer = PomodoroTimer::new(TimerSettings::default());
        assert_eq!(timer.start(), Err(ValidationError::TaskRequired));
        assert_eq!(timer.status(), TimerStatus::Idle);
        assert!(timer.start_time().is_none());
    }

    #[test]
    fn break_start_needs_no_task() {
        let mut timer = focused_timer();
        timer.start().unwrap();
        timer.complete().unwrap();
        assert_eq!(timer.mode(), TimerMode::Break);
        assert!(timer.selected_task_id().is_none());
        assert!(timer.start().unwrap().is_some());
    }

    #[test]
    fn resume_resets_reference_point() {
        let t0 = Utc::now();
        let mut timer = focused_timer();
        timer.start_at(t0).unwrap();
        timer.pause_at(t0 + Duration::seconds(10));
        let t1 = t0 + Duration::seconds(300);
        timer.resume_at(t1);
        assert_eq!(timer.start_time(), Some(t1));
    }

    #[test]
    fn tick_counts_down_and_completes() {
        let t0 = Utc::now();
        let mut timer = PomodoroTimer::new(settings(1, 1, 2, 2));
        timer.select_task(Some("t1".into()));
        timer.start_at(t0).unwrap();
        assert!(timer.tick_at(t0 + Duration::seconds(1)).is_none());
        assert_eq!(timer.remaining_secs(), 59);

        let outcome = run_out(&mut timer, t0 + Duration::seconds(1));
        assert_eq!(outcome.completed_mode, TimerMode::Focus);
        assert_eq!(outcome.next_mode, TimerMode::Break);
        let draft = outcome.pending_session().unwrap();
        assert_eq!(draft.task_id, "t1");
        assert_eq!(draft.start_time, t0);
        assert_eq!(draft.end_time, t0 + Duration::seconds(60));
        assert_eq!(draft.duration_secs, 60);
        assert!(draft.completed);
    }

    #[test]
    fn ticks_are_ignored_unless_running() {
        let mut timer = focused_timer();
        assert!(timer.tick().is_none());
        assert_eq!(timer.remaining_secs(), 25 * 60);
        timer.start().unwrap();
        timer.pause();
        timer.tick();
        assert_eq!(timer.remaining_secs(), 25 * 60);
    }

    #[test]
    fn complete_twice_yields_one_record_and_one_increment() {
        let mut timer = focused_timer();
        timer.start().unwrap();

        let first = timer.complete();
        let second = timer.complete();

        assert!(first.unwrap().pending_session().is_some());
        assert!(second.is_none());
        assert_eq!(timer.sessions_completed(), 1);
        assert!(timer.is_completing());
    }

    #[test]
    fn latch_blocks_completion_until_recording_reported() {
        let mut timer = PomodoroTimer::new(settings(1, 1, 1, 4));
        timer.select_task(Some("t1".into()));
        timer.start().unwrap();
        let outcome = timer.complete().unwrap();
        let draft = outcome.pending_session().unwrap().clone();

        // The break runs out while the recording is still in flight.
        timer.start().unwrap();
        timer.remaining_secs = 1;
        assert!(timer.tick().is_none());
        assert!(timer.is_expired());

        let notice = timer.finish_completion(Ok(stored(&draft)));
        assert!(matches!(notice, SessionNotice::Saved(_)));
        assert!(!timer.is_completing());

        let outcome = timer.complete().unwrap();
        assert_eq!(outcome.completed_mode, TimerMode::Break);
        assert_eq!(timer.mode(), TimerMode::Focus);
    }

    #[test]
    fn recorder_failure_still_transitions() {
        let mut timer = focused_timer();
        timer.start().unwrap();
        timer.complete().unwrap();
        let notice = timer.finish_completion(Err(CoreError::Custom("offline".into())));
        match notice {
            SessionNotice::NotSaved(NotSavedReason::Recorder(msg)) => assert!(msg.contains("offline")),
            other => panic!("unexpected notice {other:?}"),
        }
        assert_eq!(timer.mode(), TimerMode::Break);
        assert_eq!(timer.status(), TimerStatus::Idle);
        assert_eq!(timer.sessions_completed(), 1);
    }

    #[test]
    fn focus_without_task_completes_as_not_saved() {
        let mut timer = focused_timer();
        timer.start().unwrap();
        timer.select_task(None);
        let outcome = timer.complete().unwrap();
        assert_eq!(
            outcome.session,
            SessionDisposition::NotSaved(NotSavedReason::NoTaskSelected)
        );
        assert!(!timer.is_completing());
        assert_eq!(timer.sessions_completed(), 1);
        assert_eq!(timer.mode(), TimerMode::Break);
    }

    #[test]
    fn completion_clears_selected_task_and_start_time() {
        let mut timer = focused_timer();
        timer.start().unwrap();
        timer.complete();
        assert!(timer.selected_task_id().is_none());
        assert!(timer.start_time().is_none());
        assert_eq!(timer.remaining_secs(), timer.total_secs());
        assert_eq!(timer.total_secs(), 5 * 60);
    }

    #[test]
    fn break_completion_returns_to_focus() {
        let mut timer = focused_timer();
        timer.start().unwrap();
        timer.complete();
        timer.abandon_completion();
        timer.start().unwrap();
        let outcome = timer.complete().unwrap();
        assert_eq!(outcome.session, SessionDisposition::NotApplicable);
        assert_eq!(timer.mode(), TimerMode::Focus);
        assert_eq!(timer.total_secs(), 25 * 60);
        assert_eq!(timer.sessions_completed(), 1);
    }

    #[test]
    fn one_minute_example_scenario() {
        let t0 = Utc::now();
        let mut timer = PomodoroTimer::new(settings(1, 1, 3, 2));

        // Focus on T1 for 60s.
        timer.select_task(Some("T1".into()));
        timer.start_at(t0).unwrap();
        let outcome = run_out(&mut timer, t0);
        let draft = outcome.pending_session().unwrap().clone();
        assert_eq!(draft.task_id, "T1");
        assert_eq!(draft.duration_secs, 60);
        timer.finish_completion(Ok(stored(&draft)));
        assert_eq!(timer.sessions_completed(), 1);
        assert_eq!(timer.mode(), TimerMode::Break);

        // Break for 60s.
        let t1 = t0 + Duration::seconds(60);
        timer.start_at(t1).unwrap();
        run_out(&mut timer, t1);
        assert_eq!(timer.mode(), TimerMode::Focus);

        // Focus on T1 again: second completion earns the long break.
        let t2 = t1 + Duration::seconds(60);
        timer.select_task(Some("T1".into()));
        timer.start_at(t2).unwrap();
        let outcome = run_out(&mut timer, t2);
        timer.finish_completion(Ok(stored(outcome.pending_session().unwrap())));
        assert_eq!(timer.sessions_completed(), 2);
        assert_eq!(timer.mode(), TimerMode::LongBreak);
        assert_eq!(timer.total_secs(), 3 * 60);
    }

    #[test]
    fn skip_break_is_no_op_in_focus() {
        let mut timer = focused_timer();
        timer.start().unwrap();
        let before = timer.view();
        assert!(timer.skip_break().is_none());
        assert_eq!(timer.view(), before);
    }

    #[test]
    fn skip_break_from_running_long_break() {
        let mut timer = PomodoroTimer::new(settings(25, 5, 15, 1));
        timer.select_task(Some("t1".into()));
        timer.start().unwrap();
        timer.complete();
        timer.abandon_completion();
        assert_eq!(timer.mode(), TimerMode::LongBreak);
        timer.start().unwrap();

        assert!(timer.skip_break().is_some());
        assert_eq!(timer.mode(), TimerMode::Focus);
        assert_eq!(timer.status(), TimerStatus::Idle);
        assert_eq!(timer.remaining_secs(), 25 * 60);
        assert!(timer.start_time().is_none());
    }

    #[test]
    fn settings_change_while_idle_resizes_interval() {
        let mut timer = PomodoroTimer::new(TimerSettings::default());
        timer.update_settings(settings(50, 10, 30, 4)).unwrap();
        assert_eq!(timer.remaining_secs(), 50 * 60);
        assert_eq!(timer.total_secs(), 50 * 60);
    }

    #[test]
    fn settings_change_while_running_leaves_countdown() {
        let mut timer = focused_timer();
        timer.start().unwrap();
        timer.tick();
        timer.update_settings(settings(50, 10, 30, 4)).unwrap();
        assert_eq!(timer.remaining_secs(), 25 * 60 - 1);
        assert_eq!(timer.total_secs(), 25 * 60);

        timer.reset();
        assert_eq!(timer.total_secs(), 50 * 60);
    }

    #[test]
    fn invalid_settings_are_refused() {
        let mut timer = PomodoroTimer::new(TimerSettings::default());
        assert!(timer.update_settings(settings(0, 5, 15, 4)).is_err());
        assert_eq!(*timer.settings(), TimerSettings::default());
    }

    #[test]
    fn view_formats_remaining_time() {
        let timer = PomodoroTimer::new(TimerSettings::default());
        let view = timer.view();
        assert_eq!(view.display, "25:00");
        assert_eq!(view.progress, 0.0);
        assert_eq!(format_mmss(61), "01:01");
        assert_eq!(format_mmss(100 * 60), "100:00");
    }

    fn arb_settings() -> impl Strategy<Value = TimerSettings> {
        (1u32..120, 1u32..60, 1u32..90, 1u32..10).prop_map(|(f, b, l, n)| settings(f, b, l, n))
    }

    proptest! {
        #[test]
        fn reset_always_yields_full_idle_interval(
            s in arb_settings(),
            completions in 0usize..6,
            start in any::<bool>(),
            ticks in 0u64..200,
        ) {
            let mut timer = PomodoroTimer::new(s);
            for _ in 0..completions {
                timer.select_task(Some("t".into()));
                timer.start().unwrap();
                timer.complete();
                timer.abandon_completion();
            }
            if start {
                timer.select_task(Some("t".into()));
                timer.start().unwrap();
                for _ in 0..ticks {
                    timer.tick();
                    timer.abandon_completion();
                }
            }
            timer.reset();
            prop_assert_eq!(timer.status(), TimerStatus::Idle);
            prop_assert_eq!(timer.remaining_secs(), timer.total_secs());
            prop_assert_eq!(timer.total_secs(), u64::from(s.duration_min(timer.mode())) * 60);
            prop_assert!(timer.selected_task_id().is_none());
        }

        #[test]
        fn long_break_exactly_on_cadence(s in arb_settings(), rounds in 1u32..20) {
            let mut timer = PomodoroTimer::new(s);
            for n in 1..=rounds {
                timer.select_task(Some("t".into()));
                timer.start().unwrap();
                let outcome = timer.complete().unwrap();
                timer.abandon_completion();
                let expected = if n % s.sessions_until_long_break == 0 {
                    TimerMode::LongBreak
                } else {
                    TimerMode::Break
                };
                prop_assert_eq!(outcome.next_mode, expected);
                timer.skip_break();
            }
            prop_assert_eq!(timer.sessions_completed(), rounds);
        }
    }
}
