use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Algorithms,
    Development,
    SystemDesign,
    JobSearch,
}

pub const ALL_CATEGORIES: [Category; 4] = [
    Category::Algorithms,
    Category::Development,
    Category::SystemDesign,
    Category::JobSearch,
];

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Algorithms => "algorithms",
            Self::Development => "development",
            Self::SystemDesign => "system_design",
            Self::JobSearch => "job_search",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "algorithms" => Some(Self::Algorithms),
            "development" => Some(Self::Development),
            "system_design" => Some(Self::SystemDesign),
            "job_search" => Some(Self::JobSearch),
            _ => None,
        }
    }

    /// Display form: snake_case words title-cased ("job_search" -> "Job Search").
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Algorithms => "Algorithms",
            Self::Development => "Development",
            Self::SystemDesign => "System Design",
            Self::JobSearch => "Job Search",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
