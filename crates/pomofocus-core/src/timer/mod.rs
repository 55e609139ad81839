mod engine;
mod lifecycle;
mod settings;
mod snapshot;

pub use engine::{
    format_mmss, CompletionOutcome, NotSavedReason, PomodoroTimer, SessionDisposition,
    SessionNotice, TimerView,
};
pub use lifecycle::{AppLifecycle, LifecycleEffect};
pub use settings::{TimerMode, TimerSettings, TimerStatus};
pub use snapshot::TimerSnapshot;
