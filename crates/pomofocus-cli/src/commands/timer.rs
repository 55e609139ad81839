use clap::Subcommand;
use pomofocus_core::timer::SessionDisposition;
use pomofocus_core::{
    Command, CompletionOutcome, ConfigStore, Database, Event, PomodoroTimer, SessionRecorder,
    SettingsStore, SnapshotStore, TimerService,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{block_on, print_json, Backend, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the current interval (focus needs a selected task)
    Start,
    /// Pause the running countdown
    Pause,
    /// Resume a paused countdown
    Resume,
    /// Back to idle with a full interval of the current mode
    Reset,
    /// Skip the current break and go back to focus
    SkipBreak,
    /// Select the task the next focus interval is recorded against
    Select {
        /// Task ID
        task_id: Option<String>,
        /// Clear the selection instead
        #[arg(long, conflicts_with = "task_id")]
        clear: bool,
    },
    /// Print current timer state as JSON
    Status,
    /// Run the countdown in the foreground until interrupted
    Run {
        /// Start the current interval right away
        #[arg(long)]
        start: bool,
    },
}

/// Load the persisted timer. Time spent while no process was running is
/// applied; an interval that ran out in the meantime is completed and its
/// session recorded.
fn load_timer(
    db: &Database,
    settings: &ConfigStore,
    backend: &Backend,
) -> Result<PomodoroTimer, Box<dyn std::error::Error>> {
    let Some(snapshot) = db.load() else {
        return Ok(PomodoroTimer::new(settings.get()));
    };
    let (mut timer, completed) = PomodoroTimer::restore(snapshot, settings.get());
    if let Some(outcome) = completed {
        settle(&mut timer, outcome, backend)?;
        db.save(&timer.snapshot());
    }
    Ok(timer)
}

/// Print a completion and record its session, if any.
fn settle<R: SessionRecorder>(
    timer: &mut PomodoroTimer,
    outcome: CompletionOutcome,
    recorder: &R,
) -> CliResult {
    print_json(&outcome.event())?;
    if let Some(notice) = outcome.immediate_notice() {
        print_json(&notice.event(outcome.at))?;
    }
    if let SessionDisposition::Pending(draft) = outcome.session {
        let result = block_on(recorder.record(draft))?;
        let notice = timer.finish_completion(result);
        print_json(&notice.event(chrono::Utc::now()))?;
    }
    Ok(())
}

pub fn run(action: TimerAction) -> CliResult {
    let db = Database::open()?;
    let settings = ConfigStore::open()?;
    let backend = Backend::open()?;

    let mut timer = load_timer(&db, &settings, &backend)?;
    let event = match action {
        TimerAction::Start => timer.start()?,
        TimerAction::Pause => timer.pause(),
        TimerAction::Resume => timer.resume(),
        TimerAction::Reset => Some(timer.reset()),
        TimerAction::SkipBreak => timer.skip_break(),
        TimerAction::Select { task_id, clear } => {
            if task_id.is_none() && !clear {
                return Err("give a task ID or --clear".into());
            }
            Some(timer.select_task(task_id))
        }
        TimerAction::Status => None,
        TimerAction::Run { start } => return run_live(settings, db, backend, start),
    };

    match event {
        Some(event) => {
            db.save(&timer.snapshot());
            print_json(&event)?;
        }
        None => print_json(&timer.view())?,
    }
    Ok(())
}

/// Live countdown. The per-second state goes to stderr as a status line,
/// every other event to stdout as JSON.
fn run_live(settings: ConfigStore, db: Database, backend: Backend, start: bool) -> CliResult {
    let service = TimerService::restore(settings, db, backend);

    let timer = block_on(async move {
        let (tx, rx) = mpsc::channel(16);
        let (ev_tx, mut ev_rx) = mpsc::unbounded_channel();

        if start && tx.send(Command::Start).await.is_err() {
            warn!("timer service closed before start");
        }

        let printer = async {
            while let Some(event) = ev_rx.recv().await {
                match &event {
                    Event::StateSnapshot { view, .. } => {
                        eprint!("\r{} {}  ", view.mode, view.display);
                    }
                    other => match serde_json::to_string(other) {
                        Ok(json) => println!("\n{json}"),
                        Err(e) => warn!(error = %e, "could not serialize event"),
                    },
                }
            }
        };
        let interrupt = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "could not listen for ctrl-c");
            }
            if tx.send(Command::Shutdown).await.is_err() {
                debug!("timer service already stopped");
            }
            std::future::pending::<()>().await
        };

        let (timer, ()) = tokio::join!(service.run(rx, ev_tx), async {
            tokio::select! {
                _ = printer => {}
                _ = interrupt => {}
            }
        });
        timer
    })?;

    eprintln!();
    print_json(&timer.view())
}
