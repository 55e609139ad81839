//! Live timer driver.
//!
//! [`TimerService::run`] is a single `select!` loop on the current task. It
//! multiplexes user commands, the one-second countdown and at most one
//! in-flight session recording. Nothing is spawned: the timer is only ever
//! touched from this loop.
//!
//! The countdown interval exists only while the timer is running in the
//! foreground. It is dropped on every transition away from running and on
//! teardown, so no stale tick can fire into a newer state.

use std::future::Future;
use std::pin::Pin;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Duration, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::events::Event;
use crate::models::PomodoroSession;
use crate::timer::{
    AppLifecycle, CompletionOutcome, LifecycleEffect, PomodoroTimer, SessionDisposition,
    TimerSettings, TimerStatus, TimerView,
};
use crate::traits::{SessionRecorder, SettingsStore, SnapshotStore};

const TICK: Duration = Duration::from_secs(1);

/// Input to a running [`TimerService`].
#[derive(Debug)]
pub enum Command {
    Start,
    Pause,
    Resume,
    Reset,
    SkipBreak,
    SelectTask(Option<String>),
    UpdateSettings(TimerSettings),
    Lifecycle(AppLifecycle),
    /// Reply with the current view.
    Query(oneshot::Sender<TimerView>),
    Shutdown,
}

type Recording<'a> = Pin<Box<dyn Future<Output = Result<PomodoroSession>> + 'a>>;

pub struct TimerService<S, P, R> {
    timer: PomodoroTimer,
    settings: S,
    snapshots: P,
    recorder: R,
    /// Completion produced while restoring, handled when the loop starts.
    restored: Option<CompletionOutcome>,
}

impl<S, P, R> TimerService<S, P, R>
where
    S: SettingsStore,
    P: SnapshotStore,
    R: SessionRecorder,
{
    /// Cold start: settings from the store, timer from the last snapshot
    /// (advanced by the time the process was gone) or fresh.
    pub fn restore(settings: S, snapshots: P, recorder: R) -> Self {
        let timer_settings = settings.get();
        let (timer, restored) = match snapshots.load() {
            Some(snapshot) => PomodoroTimer::restore(snapshot, timer_settings),
            None => (PomodoroTimer::new(timer_settings), None),
        };
        Self {
            timer,
            settings,
            snapshots,
            recorder,
            restored,
        }
    }

    pub fn timer(&self) -> &PomodoroTimer {
        &self.timer
    }

    /// Drive the timer until `Shutdown` or until every command sender is
    /// dropped. Returns the timer in its final state.
    pub async fn run(
        self,
        mut commands: mpsc::Receiver<Command>,
        events: mpsc::UnboundedSender<Event>,
    ) -> PomodoroTimer {
        let TimerService {
            mut timer,
            settings,
            snapshots,
            recorder,
            restored,
        } = self;
        let mut recording: Option<Recording<'_>> = None;
        let mut countdown: Option<Interval> = None;

        if let Some(outcome) = restored {
            begin_completion(outcome, &recorder, &mut recording, &events);
            snapshots.save(&timer.snapshot());
        }

        loop {
            sync_countdown(&timer, &mut countdown);

            tokio::select! {
                cmd = commands.recv() => {
                    let Some(cmd) = cmd else { break };
                    if matches!(cmd, Command::Shutdown) {
                        break;
                    }
                    if let Some(outcome) = apply(&mut timer, cmd, &settings, &snapshots, &events) {
                        begin_completion(outcome, &recorder, &mut recording, &events);
                        snapshots.save(&timer.snapshot());
                    }
                }
                _ = next_tick(&mut countdown) => {
                    match timer.tick() {
                        Some(outcome) => {
                            begin_completion(outcome, &recorder, &mut recording, &events);
                            snapshots.save(&timer.snapshot());
                        }
                        None => emit(&events, timer.state_event()),
                    }
                }
                result = poll_recording(&mut recording) => {
                    recording = None;
                    let notice = timer.finish_completion(result);
                    emit(&events, notice.event(Utc::now()));
                    // An interval that ran out while the latch was held.
                    if timer.is_expired() {
                        if let Some(outcome) = timer.complete() {
                            begin_completion(outcome, &recorder, &mut recording, &events);
                            snapshots.save(&timer.snapshot());
                        }
                    }
                }
            }
        }

        drop(countdown);
        if recording.take().is_some() {
            warn!("shutting down with a session recording in flight, dropping it");
            timer.abandon_completion();
        }
        snapshots.save(&timer.snapshot());
        info!(status = %timer.status(), mode = %timer.mode(), "timer service stopped");
        timer
    }
}

/// Apply a user command. Persists after every status change.
fn apply<S: SettingsStore, P: SnapshotStore>(
    timer: &mut PomodoroTimer,
    cmd: Command,
    settings: &S,
    snapshots: &P,
    events: &mpsc::UnboundedSender<Event>,
) -> Option<CompletionOutcome> {
    let event = match cmd {
        Command::Start => match timer.start() {
            Ok(event) => event,
            Err(e) => Some(rejected("start", e.to_string())),
        },
        Command::Pause => timer.pause(),
        Command::Resume => timer.resume(),
        Command::Reset => Some(timer.reset()),
        Command::SkipBreak => timer.skip_break(),
        Command::SelectTask(task_id) => Some(timer.select_task(task_id)),
        Command::UpdateSettings(new_settings) => match timer.update_settings(new_settings) {
            Ok(event) => {
                settings.set(&new_settings);
                Some(event)
            }
            Err(e) => Some(rejected("update_settings", e.to_string())),
        },
        Command::Lifecycle(next) => match timer.on_lifecycle(next) {
            LifecycleEffect::Nothing => None,
            LifecycleEffect::PersistSnapshot => {
                snapshots.save(&timer.snapshot());
                None
            }
            LifecycleEffect::Resumed { elapsed_secs } => Some(Event::BackgroundReconciled {
                elapsed_secs,
                remaining_secs: timer.remaining_secs(),
                at: Utc::now(),
            }),
            LifecycleEffect::Completed(outcome) => return Some(outcome),
        },
        Command::Query(reply) => {
            if reply.send(timer.view()).is_err() {
                debug!("query caller went away");
            }
            None
        }
        Command::Shutdown => None,
    };

    if let Some(event) = event {
        let persist = !matches!(event, Event::CommandRejected { .. });
        emit(events, event);
        if persist {
            snapshots.save(&timer.snapshot());
        }
    }
    None
}

/// Announce a completion and start recording its session, if any.
fn begin_completion<'a, R: SessionRecorder>(
    outcome: CompletionOutcome,
    recorder: &'a R,
    recording: &mut Option<Recording<'a>>,
    events: &mpsc::UnboundedSender<Event>,
) {
    emit(events, outcome.event());
    if let Some(notice) = outcome.immediate_notice() {
        emit(events, notice.event(outcome.at));
    }
    if let SessionDisposition::Pending(draft) = outcome.session {
        debug!(task_id = %draft.task_id, "recording session");
        *recording = Some(Box::pin(recorder.record(draft)));
    }
}

fn rejected(command: &str, reason: String) -> Event {
    Event::CommandRejected {
        command: command.to_string(),
        reason,
        at: Utc::now(),
    }
}

fn emit(events: &mpsc::UnboundedSender<Event>, event: Event) {
    if events.send(event).is_err() {
        debug!("event receiver dropped");
    }
}

/// Countdown exists iff the timer is running and not suspended.
fn sync_countdown(timer: &PomodoroTimer, countdown: &mut Option<Interval>) {
    let should_tick = timer.status() == TimerStatus::Running && timer.suspended_at().is_none();
    match (should_tick, countdown.is_some()) {
        (true, false) => {
            let mut interval = time::interval_at(Instant::now() + TICK, TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            *countdown = Some(interval);
        }
        (false, true) => *countdown = None,
        _ => {}
    }
}

async fn next_tick(countdown: &mut Option<Interval>) {
    match countdown {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn poll_recording(recording: &mut Option<Recording<'_>>) -> Result<PomodoroSession> {
    match recording {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}
