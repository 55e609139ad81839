//! Records shared by the backend client, the local store and the CLI.
//!
//! Field names follow the backend's JSON (camelCase, with Mongo's `_id`
//! accepted as `id`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A unit of work a focus session can be bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// A completed focus interval as stored by a recorder. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroSession {
    #[serde(alias = "_id")]
    pub id: String,
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Seconds.
    #[serde(rename = "duration")]
    pub duration_secs: u64,
    #[serde(default = "default_completed")]
    pub completed: bool,
}

fn default_completed() -> bool {
    true
}

/// Session draft produced by the timer at focus completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub task_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(rename = "duration")]
    pub duration_secs: u64,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    /// `YYYY-MM-DD`, UTC.
    pub date: String,
    pub completed_pomodoros: u64,
    /// Seconds.
    pub total_focus_time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub task_id: String,
    pub task_name: String,
    pub completed_pomodoros: u64,
    pub total_focus_time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
}

/// Response of the signup and login endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_accepts_mongo_document() {
        let json = r#"{
            "_id": "65f0c2",
            "name": "Write report",
            "userId": "u1",
            "createdAt": "2024-03-12T09:30:00.000Z",
            "updatedAt": "2024-03-12T09:30:00.000Z",
            "__v": 0
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, "65f0c2");
        assert_eq!(task.description, None);
        assert_eq!(task.user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn new_session_uses_backend_field_names() {
        let start = Utc::now();
        let draft = NewSession {
            task_id: "t1".into(),
            start_time: start,
            end_time: start,
            duration_secs: 1500,
            completed: true,
        };
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["taskId"], "t1");
        assert_eq!(json["duration"], 1500);
        assert!(json.get("durationSecs").is_none());
    }
}
