use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StudyError;
use crate::models::User;

/// Cookie-based session state, persisted as JSON so the CLI keeps its
/// sign-in across invocations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
    #[serde(default)]
    pub user: Option<User>,
}

impl Session {
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(session) => session,
                Err(err) => {
                    warn!("failed to parse session file: {err}");
                    Self::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => {
                warn!("failed to read session file: {err}");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StudyError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.cookies.clear();
        self.user = None;
    }

    /// Absorb a `Set-Cookie` header value ("name=value; Path=/; ...").
    pub fn absorb_set_cookie(&mut self, header: &str) {
        let pair = header.split(';').next().unwrap_or_default();
        if let Some((name, value)) = pair.split_once('=') {
            let name = name.trim();
            if !name.is_empty() {
                self.cookies.insert(name.to_string(), value.trim().to_string());
            }
        }
    }

    /// Value for the outgoing `Cookie` header, or None when empty.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.cookies.get("csrftoken").map(String::as_str)
    }
}

pub fn session_path(home: &Path) -> PathBuf {
    home.join("session.json")
}
