//! REST client for the Pomofocus backend.
//!
//! All endpoints live under a configurable base URL such as
//! `http://localhost:5000/api`. Authenticated calls send the bearer token
//! obtained from `login`/`signup`.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::error::{ApiError, Result as CoreResult};
use crate::models::{AuthSession, DailyStats, NewSession, PomodoroSession, Task, TaskStats};
use crate::storage::ApiConfig;
use crate::traits::{SessionRecorder, TaskProvider};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base)?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base,
            token: None,
        })
    }

    /// Client for the configured backend, or `NotConfigured`.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.as_deref().ok_or(ApiError::NotConfigured)?;
        Self::new(base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    /// Request carrying the bearer token. Everything but signup and login
    /// needs one.
    fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, ApiError> {
        let token = self.token.as_deref().ok_or(ApiError::NotAuthenticated)?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp.json::<T>().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path)?;
        debug!(%url, "GET");
        self.send(self.request(Method::GET, url)?).await
    }

    // ── Auth ─────────────────────────────────────────────────────────

    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ApiError> {
        let url = self.url("auth/signup")?;
        let body = json!({ "username": username, "email": email, "password": password });
        self.send(self.http.post(url).json(&body)).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ApiError> {
        let url = self.url("auth/login")?;
        let body = json!({ "email": email, "password": password });
        self.send(self.http.post(url).json(&body)).await
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        self.get("tasks").await
    }

    pub async fn get_task(&self, id: &str) -> Result<Task, ApiError> {
        self.get(&format!("tasks/{id}")).await
    }

    pub async fn create_task(&self, name: &str, description: Option<&str>) -> Result<Task, ApiError> {
        let url = self.url("tasks")?;
        let body = json!({ "name": name, "description": description });
        self.send(self.request(Method::POST, url)?.json(&body)).await
    }

    pub async fn update_task(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<Task, ApiError> {
        let url = self.url(&format!("tasks/{id}"))?;
        let body = json!({ "name": name, "description": description });
        self.send(self.request(Method::PUT, url)?.json(&body)).await
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("tasks/{id}"))?;
        let _: serde_json::Value = self.send(self.request(Method::DELETE, url)?).await?;
        Ok(())
    }

    // ── Sessions ─────────────────────────────────────────────────────

    pub async fn create_session(&self, session: &NewSession) -> Result<PomodoroSession, ApiError> {
        let url = self.url("sessions")?;
        self.send(self.request(Method::POST, url)?.json(session)).await
    }

    /// Sessions whose start falls in the range, newest first.
    pub async fn sessions(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<PomodoroSession>, ApiError> {
        let mut url = self.url("sessions")?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(start) = start {
                query.append_pair("startDate", &start.to_rfc3339_opts(SecondsFormat::Millis, true));
            }
            if let Some(end) = end {
                query.append_pair("endDate", &end.to_rfc3339_opts(SecondsFormat::Millis, true));
            }
        }
        self.send(self.request(Method::GET, url)?).await
    }

    pub async fn sessions_for_task(&self, task_id: &str) -> Result<Vec<PomodoroSession>, ApiError> {
        self.get(&format!("sessions/task/{task_id}")).await
    }

    pub async fn daily_stats(&self) -> Result<Vec<DailyStats>, ApiError> {
        self.get("sessions/stats/daily").await
    }

    pub async fn task_stats(&self) -> Result<Vec<TaskStats>, ApiError> {
        self.get("sessions/stats/tasks").await
    }
}

impl SessionRecorder for ApiClient {
    async fn record(&self, session: NewSession) -> CoreResult<PomodoroSession> {
        Ok(self.create_session(&session).await?)
    }
}

impl TaskProvider for ApiClient {
    async fn list(&self) -> CoreResult<Vec<Task>> {
        Ok(self.list_tasks().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> ApiClient {
        ApiClient::new(&format!("{}/api", server.url()), Duration::from_secs(5))
            .unwrap()
            .with_token(Some("tok".into()))
    }

    #[tokio::test]
    async fn create_session_posts_backend_fields() {
        let mut server = mockito::Server::new_async().await;
        let start = Utc.with_ymd_and_hms(2024, 3, 12, 9, 0, 0).unwrap();
        let mock = server
            .mock("POST", "/api/sessions")
            .match_header("authorization", "Bearer tok")
            .match_body(Matcher::PartialJson(json!({
                "taskId": "t1",
                "duration": 1500,
                "completed": true,
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"_id":"s1","taskId":"t1","userId":"u1",
                    "startTime":"2024-03-12T09:00:00.000Z","endTime":"2024-03-12T09:25:00.000Z",
                    "duration":1500,"completed":true,"createdAt":"2024-03-12T09:25:00.000Z"}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let draft = NewSession {
            task_id: "t1".into(),
            start_time: start,
            end_time: start + chrono::Duration::minutes(25),
            duration_secs: 1500,
            completed: true,
        };
        let stored = client.record(draft).await.unwrap();
        assert_eq!(stored.id, "s1");
        assert_eq!(stored.duration_secs, 1500);
        assert_eq!(stored.start_time, start);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_body_message_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/sessions")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"Session validation failed"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let now = Utc::now();
        let err = client
            .create_session(&NewSession {
                task_id: "t1".into(),
                start_time: now,
                end_time: now,
                duration_secs: 60,
                completed: true,
            })
            .await
            .unwrap_err();
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Session validation failed");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn status_without_body_gets_generic_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/tasks")
            .with_status(502)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.list_tasks().await.unwrap_err();
        assert_eq!(err.to_string(), "Request failed with status 502");
    }

    #[tokio::test]
    async fn list_tasks_maps_mongo_ids() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/tasks")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"_id":"a1","name":"Read","userId":"u1"},
                    {"_id":"a2","name":"Write","description":"draft"}]"#,
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let tasks = TaskProvider::list(&client).await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, "a1");
        assert_eq!(tasks[1].description.as_deref(), Some("draft"));
    }

    #[tokio::test]
    async fn sessions_range_is_sent_as_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/sessions")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("startDate".into(), "2024-03-01T00:00:00.000Z".into()),
                Matcher::UrlEncoded("endDate".into(), "2024-03-31T00:00:00.000Z".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let client = client_for(&server);
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap();
        assert!(client.sessions(Some(start), Some(end)).await.unwrap().is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn login_returns_token_and_user() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/auth/login")
            .match_body(Matcher::Json(json!({"email": "a@b.c", "password": "pw"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token":"jwt","user":{"_id":"u1","username":"ann","email":"a@b.c"}}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&format!("{}/api/", server.url()), Duration::from_secs(5)).unwrap();
        let auth = client.login("a@b.c", "pw").await.unwrap();
        assert_eq!(auth.token, "jwt");
        assert_eq!(auth.user.id, "u1");
    }

    #[tokio::test]
    async fn stats_endpoints_decode() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/sessions/stats/daily")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"date":"2024-03-12","completedPomodoros":3,"totalFocusTime":4500}]"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/sessions/stats/tasks")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"taskId":"a1","taskName":"Read","completedPomodoros":2,"totalFocusTime":3000}]"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let daily = client.daily_stats().await.unwrap();
        assert_eq!(daily[0].completed_pomodoros, 3);
        let per_task = client.task_stats().await.unwrap();
        assert_eq!(per_task[0].task_name, "Read");
    }

    #[tokio::test]
    async fn unreachable_backend_is_network_error() {
        let client = ApiClient::new("http://127.0.0.1:9/api", Duration::from_secs(2))
            .unwrap()
            .with_token(Some("tok".into()));
        assert!(matches!(client.list_tasks().await, Err(ApiError::Network(_))));
    }

    #[tokio::test]
    async fn calls_without_token_are_not_authenticated() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/tasks")
            .with_status(200)
            .with_body("[]")
            .expect(0)
            .create_async()
            .await;

        let client = ApiClient::new(&format!("{}/api", server.url()), Duration::from_secs(5)).unwrap();
        assert!(matches!(client.list_tasks().await, Err(ApiError::NotAuthenticated)));
        assert!(matches!(
            client.sessions_for_task("t1").await,
            Err(ApiError::NotAuthenticated)
        ));
        mock.assert_async().await;
    }

    #[test]
    fn missing_base_url_is_not_configured() {
        let err = ApiClient::from_config(&ApiConfig::default()).unwrap_err();
        assert!(matches!(err, ApiError::NotConfigured));
    }
}
