use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Text,
    Pdf,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Pdf => "pdf",
        }
    }
}

/// AI-generated study summary. CRUD-only on the client; generation is
/// backend-owned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default = "default_source_type")]
    pub source_type: SourceType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_source_type() -> SourceType {
    SourceType::Text
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSummary {
    pub title: String,
    pub content: String,
    pub source_type: SourceType,
}
