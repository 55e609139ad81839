//! SQLite-based local storage.
//!
//! Provides persistent storage for:
//! - Tasks and completed focus sessions (offline mode, no backend configured)
//! - Daily and per-task statistics over those sessions
//! - Key-value store for the timer snapshot

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::warn;
use uuid::Uuid;

use super::data_dir;
use crate::error::{DatabaseError, Result as CoreResult};
use crate::models::{DailyStats, NewSession, PomodoroSession, Task, TaskStats};
use crate::timer::TimerSnapshot;
use crate::traits::{SessionRecorder, SnapshotStore, TaskProvider};

/// kv key the timer snapshot lives under.
pub const SNAPSHOT_KEY: &str = "timer_state";

/// Days of history returned by [`Database::daily_stats`].
pub const DAILY_STATS_LIMIT: u32 = 30;

type DbResult<T> = std::result::Result<T, DatabaseError>;

/// SQLite database for local storage.
pub struct Database {
    conn: Connection,
}

fn ts(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        user_id: None,
        created_at: parse_ts(3, row.get(3)?)?,
        updated_at: parse_ts(4, row.get(4)?)?,
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<PomodoroSession> {
    Ok(PomodoroSession {
        id: row.get(0)?,
        task_id: row.get(1)?,
        user_id: None,
        start_time: parse_ts(2, row.get(2)?)?,
        end_time: parse_ts(3, row.get(3)?)?,
        duration_secs: row.get(4)?,
        completed: row.get(5)?,
    })
}

impl Database {
    /// Open the database at `<data dir>/pomofocus.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> CoreResult<Self> {
        let path = data_dir()?.join("pomofocus.db");
        Ok(Self::open_at(&path)?)
    }

    pub fn open_at(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> DbResult<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tasks (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                description TEXT,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sessions (
                id          TEXT PRIMARY KEY,
                task_id     TEXT NOT NULL,
                start_time  TEXT NOT NULL,
                end_time    TEXT NOT NULL,
                duration    INTEGER NOT NULL,
                completed   INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_start_time ON sessions(start_time);
            CREATE INDEX IF NOT EXISTS idx_sessions_task_id ON sessions(task_id);",
        )?;
        Ok(())
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub fn create_task(&self, name: &str, description: Option<&str>) -> DbResult<Task> {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.map(str::to_string),
            user_id: None,
            created_at: now,
            updated_at: now,
        };
        self.conn.execute(
            "INSERT INTO tasks (id, name, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![task.id, task.name, task.description, ts(&now), ts(&now)],
        )?;
        Ok(task)
    }

    /// Newest first.
    pub fn list_tasks(&self) -> DbResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, created_at, updated_at
             FROM tasks ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map([], task_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_task(&self, id: &str) -> DbResult<Option<Task>> {
        let task = self
            .conn
            .query_row(
                "SELECT id, name, description, created_at, updated_at FROM tasks WHERE id = ?1",
                params![id],
                task_from_row,
            )
            .optional()?;
        Ok(task)
    }

    pub fn update_task(&self, id: &str, name: &str, description: Option<&str>) -> DbResult<Task> {
        let now = Utc::now();
        let changed = self.conn.execute(
            "UPDATE tasks SET name = ?2, description = ?3, updated_at = ?4 WHERE id = ?1",
            params![id, name, description, ts(&now)],
        )?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                entity: "task",
                id: id.to_string(),
            });
        }
        self.get_task(id)?.ok_or_else(|| DatabaseError::NotFound {
            entity: "task",
            id: id.to_string(),
        })
    }

    /// Sessions recorded against the task are kept.
    pub fn delete_task(&self, id: &str) -> DbResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                entity: "task",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    // ── Sessions ─────────────────────────────────────────────────────

    pub fn insert_session(&self, session: &NewSession) -> DbResult<PomodoroSession> {
        let stored = PomodoroSession {
            id: Uuid::new_v4().to_string(),
            task_id: session.task_id.clone(),
            user_id: None,
            start_time: session.start_time,
            end_time: session.end_time,
            duration_secs: session.duration_secs,
            completed: session.completed,
        };
        self.conn.execute(
            "INSERT INTO sessions (id, task_id, start_time, end_time, duration, completed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                stored.id,
                stored.task_id,
                ts(&stored.start_time),
                ts(&stored.end_time),
                stored.duration_secs,
                stored.completed,
            ],
        )?;
        Ok(stored)
    }

    /// Sessions whose start falls in the (inclusive) range, newest first.
    pub fn sessions_between(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> DbResult<Vec<PomodoroSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, task_id, start_time, end_time, duration, completed
             FROM sessions
             WHERE (?1 IS NULL OR start_time >= ?1)
               AND (?2 IS NULL OR start_time <= ?2)
             ORDER BY start_time DESC",
        )?;
        let rows = stmt.query_map(
            params![start.as_ref().map(ts), end.as_ref().map(ts)],
            session_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn sessions_for_task(&self, task_id: &str) -> DbResult<Vec<PomodoroSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, task_id, start_time, end_time, duration, completed
             FROM sessions WHERE task_id = ?1
             ORDER BY start_time DESC",
        )?;
        let rows = stmt.query_map(params![task_id], session_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // ── Statistics ───────────────────────────────────────────────────

    /// Per UTC day of session start, newest first, at most 30 days.
    pub fn daily_stats(&self) -> DbResult<Vec<DailyStats>> {
        let mut stmt = self.conn.prepare(
            "SELECT substr(start_time, 1, 10) AS day, COUNT(*), COALESCE(SUM(duration), 0)
             FROM sessions
             GROUP BY day
             ORDER BY day DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![DAILY_STATS_LIMIT], |row| {
            Ok(DailyStats {
                date: row.get(0)?,
                completed_pomodoros: row.get(1)?,
                total_focus_time: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Per task, most focused first. Sessions of deleted tasks are skipped.
    pub fn task_stats(&self) -> DbResult<Vec<TaskStats>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.task_id, t.name, COUNT(*), COALESCE(SUM(s.duration), 0) AS total
             FROM sessions s
             JOIN tasks t ON t.id = s.task_id
             GROUP BY s.task_id, t.name
             ORDER BY total DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(TaskStats {
                task_id: row.get(0)?,
                task_name: row.get(1)?,
                completed_pomodoros: row.get(2)?,
                total_focus_time: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // ── Key-value ────────────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> DbResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> DbResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl SnapshotStore for Database {
    fn load(&self) -> Option<TimerSnapshot> {
        let raw = match self.kv_get(SNAPSHOT_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "failed to read timer snapshot");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(error = %e, "discarding unreadable timer snapshot");
                None
            }
        }
    }

    fn save(&self, snapshot: &TimerSnapshot) {
        let result = serde_json::to_string(snapshot)
            .map_err(|e| e.to_string())
            .and_then(|json| self.kv_set(SNAPSHOT_KEY, &json).map_err(|e| e.to_string()));
        if let Err(e) = result {
            warn!(error = %e, "failed to save timer snapshot");
        }
    }
}

impl SessionRecorder for Database {
    async fn record(&self, session: NewSession) -> CoreResult<PomodoroSession> {
        Ok(self.insert_session(&session)?)
    }
}

impl TaskProvider for Database {
    async fn list(&self) -> CoreResult<Vec<Task>> {
        Ok(self.list_tasks()?)
    }
}
