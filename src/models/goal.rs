use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::Category;

pub const DEFAULT_DAILY_TARGET: u32 = 3;

/// One goal record per user per category. The backend owns streak
/// arithmetic and day rollover; the client only mirrors what it returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    /// Empty until the goal has been persisted at least once.
    #[serde(default)]
    pub id: String,
    pub category: Category,
    pub daily_target: u32,
    #[serde(default)]
    pub daily_progress: u32,
    #[serde(default)]
    pub weekly_streak: u32,
    /// Weekday indices, Monday = 0 .. Sunday = 6. The set type keeps
    /// entries unique; `normalize_week` caps it at 7.
    #[serde(default)]
    pub current_week_days_completed: BTreeSet<u8>,
    #[serde(default)]
    pub days_completed_this_week: u32,
    #[serde(default)]
    pub is_week_completed: bool,
    #[serde(default)]
    pub is_daily_goal_completed: bool,
    // Backend-owned rollover markers, opaque to the client.
    #[serde(default)]
    pub current_week_start: Option<String>,
    #[serde(default)]
    pub last_completed_date: Option<String>,
    #[serde(default)]
    pub streak_started_at: Option<String>,
}

impl Goal {
    /// Default goal synthesized when no server record exists yet, so
    /// callers never need to null-check.
    pub fn placeholder(category: Category) -> Self {
        Self {
            id: String::new(),
            category,
            daily_target: DEFAULT_DAILY_TARGET,
            daily_progress: 0,
            weekly_streak: 0,
            current_week_days_completed: BTreeSet::new(),
            days_completed_this_week: 0,
            is_week_completed: false,
            is_daily_goal_completed: false,
            current_week_start: None,
            last_completed_date: None,
            streak_started_at: None,
        }
    }

    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }

    /// Re-establish the weekly-set invariants after any wholesale
    /// replacement: indices in 0..7, at most 7 entries, cardinality
    /// mirrored into `days_completed_this_week` and `is_week_completed`.
    pub fn normalize_week(&mut self) {
        self.current_week_days_completed.retain(|d| *d < 7);
        self.days_completed_this_week = self.current_week_days_completed.len() as u32;
        self.is_week_completed = self.days_completed_this_week == 7;
    }
}

/// Payload returned by the progress endpoints. The subtract path also
/// carries the weekly fields, since undoing progress can retroactively
/// un-complete a day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub daily_progress: u32,
    pub is_daily_goal_completed: bool,
    #[serde(default)]
    pub daily_completion_triggered: bool,
    #[serde(default)]
    pub weekly_streak: Option<u32>,
    #[serde(default)]
    pub current_week_days_completed: Option<BTreeSet<u8>>,
    #[serde(default)]
    pub days_completed_this_week: Option<u32>,
    #[serde(default)]
    pub is_week_completed: Option<bool>,
}

/// Payload returned by mark_daily_goal_completed / remove_completed_day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionUpdate {
    #[serde(default)]
    pub message: String,
    pub weekly_streak: u32,
    #[serde(default)]
    pub current_week_days_completed: BTreeSet<u8>,
    pub days_completed_this_week: u32,
    pub is_week_completed: bool,
    #[serde(default)]
    pub last_completed_date: Option<String>,
    #[serde(default)]
    pub current_week_start: Option<String>,
}

/// Client-side weekly fallback computed from the task list when the
/// authoritative goal record is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyData {
    pub weekly_streak: u32,
    pub weekdays_completed: Vec<u8>,
}
