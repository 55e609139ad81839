use clap::Subcommand;
use pomofocus_core::{
    Config, ConfigStore, Database, PomodoroTimer, SnapshotStore, TimerSettings, TimerStatus,
};

use super::{print_json, CliResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "timer.focus_duration", "api.base_url")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value (empty string unsets optional keys)
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

/// Apply new durations to a stored idle timer. Running and paused
/// countdowns keep their interval.
fn resize_idle_timer(settings: TimerSettings) -> CliResult {
    let db = Database::open()?;
    let Some(snapshot) = db.load() else {
        return Ok(());
    };
    if snapshot.status != TimerStatus::Idle {
        return Ok(());
    }
    let (mut timer, _) = PomodoroTimer::restore(snapshot, settings);
    timer.update_settings(settings)?;
    db.save(&timer.snapshot());
    Ok(())
}

pub fn run(action: ConfigAction) -> CliResult {
    let store = ConfigStore::open()?;

    match action {
        ConfigAction::Get { key } => {
            let config = store.load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = store.load()?;
            config.set(&key, &value)?;
            store.save(&config)?;
            if key.starts_with("timer.") {
                resize_idle_timer(config.timer)?;
            }
            println!("ok");
        }
        ConfigAction::List => {
            let config = store.load()?;
            print_json(&config)?;
        }
        ConfigAction::Reset => {
            let config = Config::default();
            store.save(&config)?;
            resize_idle_timer(config.timer)?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
