use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{CONTENT_TYPE, COOKIE, RETRY_AFTER, SET_COOKIE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::api::{Backend, Session};
use crate::error::StudyError;
use crate::models::{
    Category, CompletionUpdate, Goal, NewSummary, NewTask, ProgressUpdate, Summary, Task,
    TaskPatch, User,
};

const CSRF_HEADER: &str = "X-CSRFToken";

/// REST client for the studytrack backend. Cookie session plus CSRF header
/// on every mutating request, matching the backend's Django conventions.
pub struct HttpBackend {
    base_url: String,
    http: Client,
    session: Mutex<Session>,
    /// When set, the session is re-persisted after every response that
    /// updates cookies, so the CLI stays signed in across invocations.
    session_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsrfEnvelope {
    csrf_token: String,
}

impl HttpBackend {
    pub fn new(
        base_url: impl Into<String>,
        session: Session,
        session_file: Option<PathBuf>,
    ) -> Result<Self, StudyError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StudyError::network(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            http,
            session: Mutex::new(session),
            session_file,
        })
    }

    /// Identity from the persisted session, if any.
    pub fn current_user(&self) -> Option<User> {
        self.lock_session().user.clone()
    }

    fn lock_session(&self) -> std::sync::MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Join base URL and endpoint without doubling slashes.
    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    fn persist_session(&self, session: &Session) {
        if let Some(ref path) = self.session_file {
            if let Err(err) = session.save(path) {
                warn!("failed to persist session: {err}");
            }
        }
    }

    /// Make sure a CSRF token is available, fetching one from the backend
    /// when the cookie is missing.
    fn ensure_csrf_token(&self) -> Result<String, StudyError> {
        if let Some(token) = self.lock_session().csrf_token() {
            return Ok(token.to_string());
        }
        let response = self.send(Method::GET, "csrf_token/", None::<&()>, None)?;
        let envelope: CsrfEnvelope = self.read_json(response)?;
        Ok(envelope.csrf_token)
    }

    fn send<B: Serialize>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        csrf_token: Option<&str>,
    ) -> Result<Response, StudyError> {
        let url = self.url(endpoint);
        debug!(%method, %url, "backend request");

        let mut request = self.http.request(method, &url);
        if let Some(cookie) = self.lock_session().cookie_header() {
            request = request.header(COOKIE, cookie);
        }
        if let Some(token) = csrf_token {
            request = request.header(CSRF_HEADER, token);
        }
        request = request.header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .map_err(|e| StudyError::network(e.to_string()))?;

        let mut session = self.lock_session();
        let mut changed = false;
        for value in response.headers().get_all(SET_COOKIE) {
            if let Ok(raw) = value.to_str() {
                session.absorb_set_cookie(raw);
                changed = true;
            }
        }
        if changed {
            self.persist_session(&session);
        }
        drop(session);

        self.check_status(response)
    }

    /// Mutating request: CSRF token resolved first, then sent as a header.
    fn send_mutating<B: Serialize>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<Response, StudyError> {
        let token = self.ensure_csrf_token()?;
        self.send(method, endpoint, body, Some(&token))
    }

    fn check_status(&self, response: Response) -> Result<Response, StudyError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(StudyError::rate_limited(retry_after));
        }

        let fallback = status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
        let message = response
            .json::<serde_json::Value>()
            .ok()
            .and_then(|v| backend_message(&v))
            .unwrap_or(fallback);

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StudyError::unauthorized(message),
            StatusCode::NOT_FOUND => StudyError::not_found(&message),
            _ => StudyError::validation(message),
        })
    }

    fn read_json<T: DeserializeOwned>(&self, response: Response) -> Result<T, StudyError> {
        response
            .json::<T>()
            .map_err(|e| StudyError::serialization(e.to_string()))
    }

    // ── auth (used directly by the CLI, not part of the store seam) ──

    pub fn login(&self, email: &str, password: &str) -> Result<User, StudyError> {
        let response = self.send_mutating(
            Method::POST,
            "login/",
            Some(&json!({ "email": email, "password": password })),
        )?;
        let envelope: UserEnvelope = self.read_json(response)?;
        let mut session = self.lock_session();
        session.user = Some(envelope.user.clone());
        self.persist_session(&session);
        Ok(envelope.user)
    }

    pub fn signup(
        &self,
        email: &str,
        username: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<User, StudyError> {
        let response = self.send_mutating(
            Method::POST,
            "signup/",
            Some(&json!({
                "email": email,
                "username": username,
                "password": password,
                "confirm_password": confirm_password,
            })),
        )?;
        let envelope: UserEnvelope = self.read_json(response)?;
        Ok(envelope.user)
    }

    pub fn logout(&self) -> Result<(), StudyError> {
        self.send_mutating(Method::POST, "logout/", None::<&()>)?;
        let mut session = self.lock_session();
        session.clear();
        self.persist_session(&session);
        Ok(())
    }

    pub fn me(&self) -> Result<User, StudyError> {
        let response = self.send(Method::GET, "me/", None::<&()>, None)?;
        let envelope: UserEnvelope = self.read_json(response)?;
        let mut session = self.lock_session();
        session.user = Some(envelope.user.clone());
        self.persist_session(&session);
        Ok(envelope.user)
    }
}

/// Pull a human-readable message out of a backend error body, which uses
/// `message`, `error`, or `detail` depending on the view.
fn backend_message(value: &serde_json::Value) -> Option<String> {
    for key in ["message", "error", "detail"] {
        if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
            return Some(text.to_string());
        }
    }
    None
}

impl Backend for HttpBackend {
    fn fetch_goals(&self) -> Result<Vec<Goal>, StudyError> {
        let response = self.send(Method::GET, "goals/", None::<&()>, None)?;
        self.read_json(response)
    }

    fn create_goal(&self, category: Category, daily_target: u32) -> Result<Goal, StudyError> {
        let response = self.send_mutating(
            Method::POST,
            "goals/",
            Some(&json!({ "category": category, "daily_target": daily_target })),
        )?;
        self.read_json(response)
    }

    fn update_goal(&self, goal_id: &str, daily_target: u32) -> Result<Goal, StudyError> {
        let response = self.send_mutating(
            Method::PATCH,
            &format!("goals/{goal_id}/"),
            Some(&json!({ "daily_target": daily_target })),
        )?;
        self.read_json(response)
    }

    fn add_progress(
        &self,
        goal_id: &str,
        amount: u32,
        note: Option<&str>,
    ) -> Result<ProgressUpdate, StudyError> {
        let response = self.send_mutating(
            Method::POST,
            &format!("goals/{goal_id}/add_progress/"),
            Some(&json!({ "amount": amount, "note": note })),
        )?;
        self.read_json(response)
    }

    fn subtract_progress(
        &self,
        goal_id: &str,
        amount: u32,
        note: Option<&str>,
    ) -> Result<ProgressUpdate, StudyError> {
        let response = self.send_mutating(
            Method::POST,
            &format!("goals/{goal_id}/subtract_progress/"),
            Some(&json!({ "amount": amount, "note": note })),
        )?;
        self.read_json(response)
    }

    fn mark_daily_goal_completed(&self, goal_id: &str) -> Result<CompletionUpdate, StudyError> {
        let response = self.send_mutating(
            Method::POST,
            &format!("goals/{goal_id}/mark_daily_goal_completed/"),
            None::<&()>,
        )?;
        self.read_json(response)
    }

    fn remove_completed_day(&self, goal_id: &str) -> Result<CompletionUpdate, StudyError> {
        let response = self.send_mutating(
            Method::POST,
            &format!("goals/{goal_id}/remove_completed_day/"),
            None::<&()>,
        )?;
        self.read_json(response)
    }

    fn fetch_tasks(&self) -> Result<Vec<Task>, StudyError> {
        let response = self.send(Method::GET, "tasks/", None::<&()>, None)?;
        self.read_json(response)
    }

    fn create_task(&self, new: &NewTask) -> Result<Task, StudyError> {
        let response = self.send_mutating(Method::POST, "tasks/", Some(new))?;
        self.read_json(response)
    }

    fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, StudyError> {
        let response =
            self.send_mutating(Method::PATCH, &format!("tasks/{id}/"), Some(patch))?;
        self.read_json(response)
    }

    fn delete_task(&self, id: &str) -> Result<(), StudyError> {
        self.send_mutating(Method::DELETE, &format!("tasks/{id}/"), None::<&()>)?;
        Ok(())
    }

    fn fetch_summaries(&self) -> Result<Vec<Summary>, StudyError> {
        let response = self.send(Method::GET, "summaries/", None::<&()>, None)?;
        self.read_json(response)
    }

    fn create_summary(&self, new: &NewSummary) -> Result<Summary, StudyError> {
        let response = self.send_mutating(Method::POST, "summaries/", Some(new))?;
        self.read_json(response)
    }

    fn delete_summary(&self, id: &str) -> Result<(), StudyError> {
        self.send_mutating(Method::DELETE, &format!("summaries/{id}/"), None::<&()>)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_join_strips_duplicate_slashes() {
        let backend =
            HttpBackend::new("http://localhost:8000/api/", Session::default(), None).unwrap();
        assert_eq!(
            backend.url("/goals/"),
            "http://localhost:8000/api/goals/"
        );
        assert_eq!(backend.url("tasks/"), "http://localhost:8000/api/tasks/");
    }

    #[test]
    fn backend_message_prefers_message_key() {
        let v = json!({ "message": "bad target", "detail": "ignored" });
        assert_eq!(backend_message(&v).as_deref(), Some("bad target"));
        let v = json!({ "error": "nope" });
        assert_eq!(backend_message(&v).as_deref(), Some("nope"));
        assert_eq!(backend_message(&json!({})), None);
    }
}
