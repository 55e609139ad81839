use chrono::{DateTime, Utc};
use clap::Subcommand;

use super::{block_on, print_json, Backend, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Completed pomodoros and focus time per day (last 30 days with activity)
    Daily,
    /// Completed pomodoros and focus time per task
    Tasks,
    /// Recorded sessions, newest first
    Sessions {
        /// Only sessions of this task
        #[arg(long)]
        task: Option<String>,
        /// Earliest start time (RFC 3339)
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        /// Latest start time (RFC 3339)
        #[arg(long)]
        to: Option<DateTime<Utc>>,
    },
}

pub fn run(action: StatsAction) -> CliResult {
    let backend = Backend::open()?;

    match action {
        StatsAction::Daily => {
            let stats = match &backend {
                Backend::Remote(client) => block_on(client.daily_stats())??,
                Backend::Local(db) => db.daily_stats()?,
            };
            print_json(&stats)?;
        }
        StatsAction::Tasks => {
            let stats = match &backend {
                Backend::Remote(client) => block_on(client.task_stats())??,
                Backend::Local(db) => db.task_stats()?,
            };
            print_json(&stats)?;
        }
        StatsAction::Sessions { task, from, to } => {
            let sessions = match (&backend, task) {
                (Backend::Remote(client), Some(task)) => {
                    block_on(client.sessions_for_task(&task))??
                }
                (Backend::Remote(client), None) => block_on(client.sessions(from, to))??,
                (Backend::Local(db), Some(task)) => db.sessions_for_task(&task)?,
                (Backend::Local(db), None) => db.sessions_between(from, to)?,
            };
            print_json(&sessions)?;
        }
    }
    Ok(())
}
