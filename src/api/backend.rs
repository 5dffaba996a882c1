use crate::error::StudyError;
use crate::models::{
    Category, CompletionUpdate, Goal, NewSummary, NewTask, ProgressUpdate, Summary, Task,
    TaskPatch,
};

/// The remote authority. Stores depend on this seam instead of a concrete
/// transport so tests can substitute a scripted implementation.
pub trait Backend: Send + Sync {
    fn fetch_goals(&self) -> Result<Vec<Goal>, StudyError>;
    fn create_goal(&self, category: Category, daily_target: u32) -> Result<Goal, StudyError>;
    fn update_goal(&self, goal_id: &str, daily_target: u32) -> Result<Goal, StudyError>;
    fn add_progress(
        &self,
        goal_id: &str,
        amount: u32,
        note: Option<&str>,
    ) -> Result<ProgressUpdate, StudyError>;
    fn subtract_progress(
        &self,
        goal_id: &str,
        amount: u32,
        note: Option<&str>,
    ) -> Result<ProgressUpdate, StudyError>;
    fn mark_daily_goal_completed(&self, goal_id: &str) -> Result<CompletionUpdate, StudyError>;
    fn remove_completed_day(&self, goal_id: &str) -> Result<CompletionUpdate, StudyError>;

    fn fetch_tasks(&self) -> Result<Vec<Task>, StudyError>;
    fn create_task(&self, new: &NewTask) -> Result<Task, StudyError>;
    fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, StudyError>;
    fn delete_task(&self, id: &str) -> Result<(), StudyError>;

    fn fetch_summaries(&self) -> Result<Vec<Summary>, StudyError>;
    fn create_summary(&self, new: &NewSummary) -> Result<Summary, StudyError>;
    fn delete_summary(&self, id: &str) -> Result<(), StudyError>;
}
