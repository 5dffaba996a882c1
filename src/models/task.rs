use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Category;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub category: Category,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub progress: u32,
}

impl Task {
    /// Optimistic local task shown while the create request is in flight.
    /// The ulid id and client timestamps are replaced by the server's on
    /// success; on failure the entry is removed entirely.
    pub fn pending(title: impl Into<String>, category: Category) -> Self {
        let now = Utc::now();
        Self {
            id: ulid::Ulid::new().to_string(),
            title: title.into(),
            completed: false,
            category,
            description: None,
            created_at: now,
            updated_at: now,
            due_date: None,
            priority: 0,
            tags: Vec::new(),
            progress: 0,
        }
    }
}

/// Fields sent when creating a task.
#[derive(Debug, Clone, Serialize)]
pub struct NewTask {
    pub title: String,
    pub category: Category,
}

/// Partial update for an existing task. Only set fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_task_starts_incomplete_with_nonempty_id() {
        let t = Task::pending("Solve two-sum", Category::Algorithms);
        assert!(!t.completed);
        assert!(!t.id.is_empty());
        assert_eq!(t.created_at, t.updated_at);
    }

    #[test]
    fn patch_serializes_only_set_fields() {
        let json = serde_json::to_string(&TaskPatch::completed(true)).unwrap();
        assert_eq!(json, r#"{"completed":true}"#);
    }
}
