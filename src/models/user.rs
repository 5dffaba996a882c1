use serde::{Deserialize, Serialize};

/// Authenticated identity. Scopes all goal/task state and cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub email: String,
    pub username: String,
}

impl User {
    /// Key used to scope store state and cache entries to this user. The
    /// backend does not always include a numeric id, so fall back to the
    /// (unique) username.
    pub fn identity_key(&self) -> &str {
        if self.id.is_empty() {
            &self.username
        } else {
            &self.id
        }
    }
}
