use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Datelike, Duration, Local, NaiveDate, Utc};
use tracing::{debug, warn};

use crate::api::Backend;
use crate::error::StudyError;
use crate::models::{Category, NewTask, Task, TaskPatch, WeeklyData};
use crate::store::{Cache, EventSink, GoalStore, StoreEvent};

/// The task list (newest first) with optimistic mutations and rollback.
///
/// Completion toggles drive the goal store's progress operations, so task
/// and goal state stay consistent from the user's point of view. The goal
/// store is an explicit constructor dependency, never an ambient global.
pub struct TaskStore {
    backend: Arc<dyn Backend>,
    cache: Arc<dyn Cache>,
    goals: Arc<GoalStore>,
    events: EventSink,
    inner: Mutex<TaskInner>,
}

#[derive(Default)]
struct TaskInner {
    identity: Option<String>,
    tasks: Vec<Task>,
    generations: HashMap<String, u64>,
    last_error: Option<String>,
}

impl TaskStore {
    pub fn new(
        backend: Arc<dyn Backend>,
        cache: Arc<dyn Cache>,
        goals: Arc<GoalStore>,
        events: EventSink,
    ) -> Self {
        Self {
            backend,
            cache,
            goals,
            events,
            inner: Mutex::new(TaskInner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TaskInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_identity(&self, identity: Option<String>) {
        let mut inner = self.lock();
        if inner.identity != identity {
            inner.tasks.clear();
            inner.generations.clear();
            inner.last_error = None;
        }
        inner.identity = identity;
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    pub fn task(&self, id: &str) -> Option<Task> {
        self.lock().tasks.iter().find(|t| t.id == id).cloned()
    }

    pub fn tasks_by_category(&self, category: Category) -> Vec<Task> {
        self.lock()
            .tasks
            .iter()
            .filter(|t| t.category == category)
            .cloned()
            .collect()
    }

    pub fn completed_count(&self, category: Category) -> usize {
        self.lock()
            .tasks
            .iter()
            .filter(|t| t.category == category && t.completed)
            .count()
    }

    pub fn total_count(&self, category: Category) -> usize {
        self.lock()
            .tasks
            .iter()
            .filter(|t| t.category == category)
            .count()
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    /// Replace the task list from the remote authority, with the same
    /// cache-fallback policy as the goal fetch.
    pub fn refresh_tasks(&self) -> Result<(), StudyError> {
        let identity = {
            let mut inner = self.lock();
            match inner.identity.clone() {
                Some(identity) => identity,
                None => {
                    inner.tasks.clear();
                    return Ok(());
                }
            }
        };

        match self.backend.fetch_tasks() {
            Ok(mut tasks) => {
                tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                let mut inner = self.lock();
                inner.tasks = tasks;
                inner.last_error = None;
                self.write_cache(&inner, &identity);
                Ok(())
            }
            Err(err) => {
                let mut inner = self.lock();
                inner.last_error = Some(err.message.clone());
                if inner.tasks.is_empty() {
                    self.hydrate_from_cache(&mut inner, &identity);
                }
                Err(err)
            }
        }
    }

    /// Prepend a temporary task immediately, then persist it. On success
    /// the temporary entry is replaced by the server's record; on failure
    /// it is removed entirely. No partial state survives.
    pub fn add_task(&self, title: &str, category: Category) -> Result<Task, StudyError> {
        let temp = Task::pending(title, category);
        let temp_id = temp.id.clone();
        {
            let mut inner = self.lock();
            inner.tasks.insert(0, temp);
        }
        self.events.emit(StoreEvent::notice(
            "Task added",
            format!("\"{title}\" has been added to your tasks."),
        ));

        let new = NewTask {
            title: title.to_string(),
            category,
        };
        match self.backend.create_task(&new) {
            Ok(task) => {
                let mut inner = self.lock();
                if let Some(entry) = inner.tasks.iter_mut().find(|t| t.id == temp_id) {
                    *entry = task.clone();
                }
                inner.last_error = None;
                if let Some(identity) = inner.identity.clone() {
                    self.write_cache(&inner, &identity);
                }
                Ok(task)
            }
            Err(err) => {
                let mut inner = self.lock();
                inner.tasks.retain(|t| t.id != temp_id);
                inner.last_error = Some(err.message.clone());
                drop(inner);
                self.events.emit(StoreEvent::error(
                    "Error",
                    format!("Failed to add task: {}", err.message),
                ));
                Err(err)
            }
        }
    }

    /// Flip completion optimistically, persist it, then sync the goal for
    /// the task's category. Failure of either network call reverts the
    /// local flag; the two backend resources are not atomic (accepted).
    pub fn toggle_task(&self, id: &str) -> Result<Task, StudyError> {
        let (snapshot, now_completed, generation) = {
            let mut inner = self.lock();
            let Some(task) = inner.tasks.iter_mut().find(|t| t.id == id) else {
                return Err(StudyError::not_found(&format!("task {id}")));
            };
            let snapshot = task.clone();
            task.completed = !task.completed;
            task.updated_at = Utc::now();
            let now_completed = task.completed;
            let generation = bump_generation(&mut inner, id);
            (snapshot, now_completed, generation)
        };

        let persisted = self
            .backend
            .update_task(id, &TaskPatch::completed(now_completed));
        let task = match persisted {
            Ok(task) => {
                let mut inner = self.lock();
                if generation_current(&inner, id, generation) {
                    if let Some(entry) = inner.tasks.iter_mut().find(|t| t.id == id) {
                        *entry = task.clone();
                    }
                    if let Some(identity) = inner.identity.clone() {
                        self.write_cache(&inner, &identity);
                    }
                } else {
                    debug!(task = id, "discarding stale toggle response");
                }
                task
            }
            Err(err) => {
                self.rollback(id, generation, &snapshot);
                self.lock().last_error = Some(err.message.clone());
                self.events.emit(StoreEvent::error(
                    "Error",
                    format!("Failed to update task: {}", err.message),
                ));
                return Err(err);
            }
        };

        // A task can be completed before any goal is configured; skip the
        // goal sync silently when there is no persisted goal yet.
        let goal = self.goals.goal(snapshot.category);
        if !goal.is_persisted() {
            return Ok(task);
        }

        let progress = if now_completed {
            self.goals.add_progress(&goal.id, 1, Some(&snapshot.title))
        } else {
            self.goals
                .subtract_progress(&goal.id, 1, Some(&snapshot.title))
        };
        if let Err(err) = progress {
            // Compensating rollback: the backend task record stays changed,
            // but the visible task and goal state return to their
            // pre-toggle values together.
            self.rollback(id, generation, &snapshot);
            self.lock().last_error = Some(err.message.clone());
            self.events.emit(StoreEvent::error(
                "Error",
                format!("Failed to update goal progress: {}", err.message),
            ));
            return Err(err);
        }

        Ok(task)
    }

    /// Rename a task: optimistic, with rollback on failure.
    pub fn edit_task(&self, id: &str, new_title: &str) -> Result<Task, StudyError> {
        let (snapshot, generation) = {
            let mut inner = self.lock();
            let Some(task) = inner.tasks.iter_mut().find(|t| t.id == id) else {
                return Err(StudyError::not_found(&format!("task {id}")));
            };
            let snapshot = task.clone();
            task.title = new_title.to_string();
            task.updated_at = Utc::now();
            let generation = bump_generation(&mut inner, id);
            (snapshot, generation)
        };

        match self.backend.update_task(id, &TaskPatch::title(new_title)) {
            Ok(task) => {
                let mut inner = self.lock();
                if generation_current(&inner, id, generation) {
                    if let Some(entry) = inner.tasks.iter_mut().find(|t| t.id == id) {
                        *entry = task.clone();
                    }
                    if let Some(identity) = inner.identity.clone() {
                        self.write_cache(&inner, &identity);
                    }
                }
                drop(inner);
                self.events.emit(StoreEvent::notice(
                    "Task updated",
                    "Your task has been updated successfully.",
                ));
                Ok(task)
            }
            Err(err) => {
                self.rollback(id, generation, &snapshot);
                self.lock().last_error = Some(err.message.clone());
                self.events.emit(StoreEvent::error(
                    "Error",
                    format!("Failed to update task: {}", err.message),
                ));
                Err(err)
            }
        }
    }

    /// Remove a task: optimistic, restored at its original index if the
    /// delete fails remotely.
    pub fn delete_task(&self, id: &str) -> Result<(), StudyError> {
        let (removed, index) = {
            let mut inner = self.lock();
            let Some(index) = inner.tasks.iter().position(|t| t.id == id) else {
                return Err(StudyError::not_found(&format!("task {id}")));
            };
            (inner.tasks.remove(index), index)
        };

        match self.backend.delete_task(id) {
            Ok(()) => {
                let mut inner = self.lock();
                inner.last_error = None;
                inner.generations.remove(id);
                if let Some(identity) = inner.identity.clone() {
                    self.write_cache(&inner, &identity);
                }
                drop(inner);
                self.events.emit(StoreEvent::notice(
                    "Task deleted",
                    "Your task has been deleted successfully.",
                ));
                Ok(())
            }
            Err(err) => {
                let mut inner = self.lock();
                let index = index.min(inner.tasks.len());
                inner.tasks.insert(index, removed);
                inner.last_error = Some(err.message.clone());
                drop(inner);
                self.events.emit(StoreEvent::error(
                    "Error",
                    format!("Failed to delete task: {}", err.message),
                ));
                Err(err)
            }
        }
    }

    /// Client-side weekly fallback: tasks completed within the trailing
    /// 7 days, bucketed by calendar day, mapped to weekday indices
    /// (Monday = 0). Used only when the authoritative goal record's own
    /// weekly fields are unavailable.
    pub fn weekly_data(&self, category: Category) -> WeeklyData {
        self.weekly_data_at(Local::now().date_naive(), category)
    }

    pub fn weekly_data_at(&self, today: NaiveDate, category: Category) -> WeeklyData {
        let window_start = today - Duration::days(6);
        let days: BTreeSet<NaiveDate> = self
            .lock()
            .tasks
            .iter()
            .filter(|t| t.category == category && t.completed)
            .map(|t| t.updated_at.date_naive())
            .filter(|d| *d >= window_start && *d <= today)
            .collect();

        let weekdays_completed: Vec<u8> = days
            .iter()
            .map(|d| d.weekday().num_days_from_monday() as u8)
            .collect();
        WeeklyData {
            weekly_streak: days.len() as u32,
            weekdays_completed,
        }
    }

    /// Undo the optimistic change for a task, unless a newer mutation has
    /// taken ownership of it since.
    fn rollback(&self, id: &str, generation: u64, snapshot: &Task) {
        let mut inner = self.lock();
        if !generation_current(&inner, id, generation) {
            debug!(task = id, "skipping rollback for superseded mutation");
            return;
        }
        if let Some(entry) = inner.tasks.iter_mut().find(|t| t.id == id) {
            *entry = snapshot.clone();
        }
    }

    fn cache_key(identity: &str) -> String {
        format!("studytrack-tasks-{identity}")
    }

    fn write_cache(&self, inner: &TaskInner, identity: &str) {
        match serde_json::to_string(&inner.tasks) {
            Ok(payload) => self.cache.set(&Self::cache_key(identity), &payload),
            Err(err) => warn!("failed to serialize task cache: {err}"),
        }
    }

    fn hydrate_from_cache(&self, inner: &mut TaskInner, identity: &str) {
        let Some(raw) = self.cache.get(&Self::cache_key(identity)) else {
            return;
        };
        match serde_json::from_str::<Vec<Task>>(&raw) {
            Ok(tasks) => {
                debug!("hydrated {} tasks from cache", tasks.len());
                inner.tasks = tasks;
            }
            Err(err) => warn!("failed to parse cached tasks: {err}"),
        }
    }
}

fn bump_generation(inner: &mut TaskInner, id: &str) -> u64 {
    let entry = inner.generations.entry(id.to_string()).or_insert(0);
    *entry += 1;
    *entry
}

fn generation_current(inner: &TaskInner, id: &str, generation: u64) -> bool {
    inner.generations.get(id) == Some(&generation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn task_completed_on(day: NaiveDate, category: Category) -> Task {
        let mut t = Task::pending("t", category);
        t.completed = true;
        t.updated_at = Utc
            .from_utc_datetime(&day.and_hms_opt(12, 0, 0).expect("valid time"));
        t
    }

    fn store_with(tasks: Vec<Task>) -> TaskStore {
        struct NoBackend;
        impl Backend for NoBackend {
            fn fetch_goals(&self) -> Result<Vec<crate::models::Goal>, StudyError> {
                Ok(vec![])
            }
            fn create_goal(
                &self,
                _: Category,
                _: u32,
            ) -> Result<crate::models::Goal, StudyError> {
                Err(StudyError::network("offline"))
            }
            fn update_goal(&self, _: &str, _: u32) -> Result<crate::models::Goal, StudyError> {
                Err(StudyError::network("offline"))
            }
            fn add_progress(
                &self,
                _: &str,
                _: u32,
                _: Option<&str>,
            ) -> Result<crate::models::ProgressUpdate, StudyError> {
                Err(StudyError::network("offline"))
            }
            fn subtract_progress(
                &self,
                _: &str,
                _: u32,
                _: Option<&str>,
            ) -> Result<crate::models::ProgressUpdate, StudyError> {
                Err(StudyError::network("offline"))
            }
            fn mark_daily_goal_completed(
                &self,
                _: &str,
            ) -> Result<crate::models::CompletionUpdate, StudyError> {
                Err(StudyError::network("offline"))
            }
            fn remove_completed_day(
                &self,
                _: &str,
            ) -> Result<crate::models::CompletionUpdate, StudyError> {
                Err(StudyError::network("offline"))
            }
            fn fetch_tasks(&self) -> Result<Vec<Task>, StudyError> {
                Ok(vec![])
            }
            fn create_task(&self, _: &NewTask) -> Result<Task, StudyError> {
                Err(StudyError::network("offline"))
            }
            fn update_task(&self, _: &str, _: &TaskPatch) -> Result<Task, StudyError> {
                Err(StudyError::network("offline"))
            }
            fn delete_task(&self, _: &str) -> Result<(), StudyError> {
                Err(StudyError::network("offline"))
            }
            fn fetch_summaries(&self) -> Result<Vec<crate::models::Summary>, StudyError> {
                Ok(vec![])
            }
            fn create_summary(
                &self,
                _: &crate::models::NewSummary,
            ) -> Result<crate::models::Summary, StudyError> {
                Err(StudyError::network("offline"))
            }
            fn delete_summary(&self, _: &str) -> Result<(), StudyError> {
                Err(StudyError::network("offline"))
            }
        }

        let backend = Arc::new(NoBackend);
        let cache = Arc::new(crate::store::MemoryCache::new());
        let goals = Arc::new(GoalStore::new(
            backend.clone(),
            cache.clone(),
            EventSink::disabled(),
        ));
        let store = TaskStore::new(backend, cache, goals, EventSink::disabled());
        store.lock().tasks = tasks;
        store
    }

    #[test]
    fn weekly_data_counts_distinct_days_in_window() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 28).expect("valid date"); // a Friday
        let monday = NaiveDate::from_ymd_opt(2026, 8, 24).expect("valid date");
        let store = store_with(vec![
            task_completed_on(monday, Category::JobSearch),
            task_completed_on(monday, Category::JobSearch), // same day, still one
            task_completed_on(monday + Duration::days(1), Category::JobSearch),
            task_completed_on(today, Category::JobSearch),
            task_completed_on(today, Category::Algorithms), // other category
        ]);

        let data = store.weekly_data_at(today, Category::JobSearch);
        assert_eq!(data.weekly_streak, 3);
        assert_eq!(data.weekdays_completed, vec![0, 1, 4]);
    }

    #[test]
    fn weekly_data_ignores_tasks_outside_trailing_week() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 28).expect("valid date");
        let store = store_with(vec![
            task_completed_on(today - Duration::days(7), Category::Development),
            task_completed_on(today + Duration::days(1), Category::Development),
        ]);
        let data = store.weekly_data_at(today, Category::Development);
        assert_eq!(data.weekly_streak, 0);
        assert!(data.weekdays_completed.is_empty());
    }

    #[test]
    fn weekly_data_ignores_incomplete_tasks() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 28).expect("valid date");
        let mut t = task_completed_on(today, Category::Development);
        t.completed = false;
        let store = store_with(vec![t]);
        assert_eq!(store.weekly_data_at(today, Category::Development).weekly_streak, 0);
    }

    #[test]
    fn task_cache_key_is_identity_scoped() {
        assert_ne!(TaskStore::cache_key("a"), TaskStore::cache_key("b"));
    }
}
