use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::api::Backend;
use crate::error::StudyError;
use crate::models::{Category, CompletionUpdate, Goal, ProgressUpdate};
use crate::store::{Cache, EventSink, StoreEvent};

/// Per-category goal state synchronized with the remote authority.
///
/// The server owns all streak arithmetic; this store mirrors responses,
/// falls back to the local cache on fetch failure, and guards against
/// out-of-order responses with per-category generation tokens.
pub struct GoalStore {
    backend: Arc<dyn Backend>,
    cache: Arc<dyn Cache>,
    events: EventSink,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    identity: Option<String>,
    goals: HashMap<Category, Goal>,
    generations: HashMap<Category, u64>,
    last_error: Option<String>,
}

impl GoalStore {
    pub fn new(backend: Arc<dyn Backend>, cache: Arc<dyn Cache>, events: EventSink) -> Self {
        Self {
            backend,
            cache,
            events,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Goals are per-user; switching or clearing the identity drops all
    /// in-memory state so nothing leaks across sign-in boundaries.
    pub fn set_identity(&self, identity: Option<String>) {
        let mut inner = self.lock();
        if inner.identity != identity {
            inner.goals.clear();
            inner.generations.clear();
            inner.last_error = None;
        }
        inner.identity = identity;
    }

    pub fn identity(&self) -> Option<String> {
        self.lock().identity.clone()
    }

    /// The stored goal for a category, or a synthesized placeholder so
    /// callers never null-check. Never fails, never blocks on the network.
    pub fn goal(&self, category: Category) -> Goal {
        self.lock()
            .goals
            .get(&category)
            .cloned()
            .unwrap_or_else(|| Goal::placeholder(category))
    }

    /// All known goals, ordered by category.
    pub fn goals(&self) -> Vec<Goal> {
        let inner = self.lock();
        let mut goals: Vec<Goal> = inner.goals.values().cloned().collect();
        goals.sort_by_key(|g| g.category);
        goals
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    /// Replace all goal state from the remote authority.
    ///
    /// Without an identity this clears state and skips the network. On
    /// failure the in-memory state is preserved and, if empty, hydrated
    /// from the cache.
    pub fn fetch_goals(&self) -> Result<(), StudyError> {
        let identity = {
            let mut inner = self.lock();
            match inner.identity.clone() {
                Some(identity) => identity,
                None => {
                    inner.goals.clear();
                    return Ok(());
                }
            }
        };

        match self.backend.fetch_goals() {
            Ok(goals) => {
                let mut inner = self.lock();
                inner.goals = goals
                    .into_iter()
                    .map(|mut g| {
                        g.normalize_week();
                        (g.category, g)
                    })
                    .collect();
                inner.last_error = None;
                self.write_cache(&inner, &identity);
                Ok(())
            }
            Err(err) => {
                let mut inner = self.lock();
                inner.last_error = Some(err.message.clone());
                if inner.goals.is_empty() {
                    self.hydrate_from_cache(&mut inner, &identity);
                }
                Err(err)
            }
        }
    }

    /// Create the goal for a category or patch its daily target.
    ///
    /// Returns a success flag instead of an error: failures are logged and
    /// surfaced through the event channel, matching the UI contract.
    pub fn update_goal(&self, category: Category, daily_target: u32) -> bool {
        let (identity, existing_id, generation) = {
            let mut inner = self.lock();
            let identity = match inner.identity.clone() {
                Some(identity) => identity,
                None => return false,
            };
            let existing_id = inner
                .goals
                .get(&category)
                .filter(|g| g.is_persisted())
                .map(|g| g.id.clone());
            (identity, existing_id, bump_generation(&mut inner, category))
        };

        let result = match existing_id {
            Some(id) => self.backend.update_goal(&id, daily_target),
            None => self.backend.create_goal(category, daily_target),
        };

        match result {
            Ok(mut goal) => {
                goal.normalize_week();
                let mut inner = self.lock();
                if !generation_current(&inner, category, generation) {
                    debug!(%category, "discarding stale update_goal response");
                    return true;
                }
                inner.goals.insert(category, goal);
                inner.last_error = None;
                self.write_cache(&inner, &identity);
                drop(inner);
                self.events.emit(StoreEvent::notice(
                    "Goal updated",
                    format!(
                        "{} daily goal set to {} tasks",
                        category.display_name(),
                        daily_target
                    ),
                ));
                true
            }
            Err(err) => {
                self.record_failure("Failed to update goal", &err);
                false
            }
        }
    }

    /// Ask the server to add progress units, then merge its response.
    pub fn add_progress(
        &self,
        goal_id: &str,
        amount: u32,
        note: Option<&str>,
    ) -> Result<ProgressUpdate, StudyError> {
        self.apply_progress(goal_id, amount, note, false)
    }

    /// Ask the server to subtract progress units. The response carries the
    /// full weekly fields, since undoing progress can retroactively
    /// un-complete a day.
    pub fn subtract_progress(
        &self,
        goal_id: &str,
        amount: u32,
        note: Option<&str>,
    ) -> Result<ProgressUpdate, StudyError> {
        self.apply_progress(goal_id, amount, note, true)
    }

    fn apply_progress(
        &self,
        goal_id: &str,
        amount: u32,
        note: Option<&str>,
        subtract: bool,
    ) -> Result<ProgressUpdate, StudyError> {
        let target = self.begin_mutation(goal_id);

        let result = if subtract {
            self.backend.subtract_progress(goal_id, amount, note)
        } else {
            self.backend.add_progress(goal_id, amount, note)
        };

        let update = match result {
            Ok(update) => update,
            Err(err) => {
                let title = if subtract {
                    "Failed to subtract goal progress"
                } else {
                    "Failed to add goal progress"
                };
                self.record_failure(title, &err);
                return Err(err);
            }
        };

        if let Some((category, generation)) = target {
            let mut inner = self.lock();
            if !generation_current(&inner, category, generation) {
                debug!(%category, "discarding stale progress response");
                return Ok(update);
            }
            if let Some(goal) = inner.goals.get_mut(&category) {
                goal.daily_progress = update.daily_progress;
                goal.is_daily_goal_completed = update.is_daily_goal_completed;
                if let Some(ref days) = update.current_week_days_completed {
                    goal.current_week_days_completed = days.clone();
                }
                if let Some(streak) = update.weekly_streak {
                    goal.weekly_streak = streak;
                }
                goal.normalize_week();
            }
            inner.last_error = None;
            if let Some(identity) = inner.identity.clone() {
                self.write_cache(&inner, &identity);
            }
            drop(inner);

            if update.daily_completion_triggered {
                self.events.emit(StoreEvent::DailyGoalCompleted {
                    category,
                    message: format!("{} daily goal completed!", category.display_name()),
                });
            }
        }

        Ok(update)
    }

    /// Mark today as completed for the goal. The caller layer is expected
    /// to have checked `is_daily_goal_completed` first; the store sends
    /// unconditionally once invoked.
    pub fn mark_daily_goal_completed(
        &self,
        goal_id: &str,
    ) -> Result<CompletionUpdate, StudyError> {
        let target = self.begin_mutation(goal_id);
        match self.backend.mark_daily_goal_completed(goal_id) {
            Ok(update) => {
                self.apply_completion(target, &update, true);
                self.events.emit(StoreEvent::notice(
                    "Daily goal completed!",
                    update.message.clone(),
                ));
                Ok(update)
            }
            Err(err) => {
                self.record_failure("Failed to mark goal as completed", &err);
                Err(err)
            }
        }
    }

    /// Undo today's completion. Caller layer checks membership in the
    /// weekly set before invoking.
    pub fn remove_daily_goal_completion(
        &self,
        goal_id: &str,
    ) -> Result<CompletionUpdate, StudyError> {
        let target = self.begin_mutation(goal_id);
        match self.backend.remove_completed_day(goal_id) {
            Ok(update) => {
                self.apply_completion(target, &update, false);
                self.events.emit(StoreEvent::notice(
                    "Goal completion removed",
                    update.message.clone(),
                ));
                Ok(update)
            }
            Err(err) => {
                self.record_failure("Failed to remove goal completion", &err);
                Err(err)
            }
        }
    }

    /// Locate the category owning a goal id and take a generation token
    /// for the request about to be dispatched.
    fn begin_mutation(&self, goal_id: &str) -> Option<(Category, u64)> {
        let mut inner = self.lock();
        let category = inner
            .goals
            .values()
            .find(|g| g.id == goal_id)
            .map(|g| g.category)?;
        let generation = bump_generation(&mut inner, category);
        Some((category, generation))
    }

    /// Weekly fields are replaced wholesale from the server response; the
    /// client never recomputes streaks locally.
    fn apply_completion(
        &self,
        target: Option<(Category, u64)>,
        update: &CompletionUpdate,
        completed_today: bool,
    ) {
        let Some((category, generation)) = target else {
            return;
        };
        let mut inner = self.lock();
        if !generation_current(&inner, category, generation) {
            debug!(%category, "discarding stale completion response");
            return;
        }
        if let Some(goal) = inner.goals.get_mut(&category) {
            goal.weekly_streak = update.weekly_streak;
            goal.current_week_days_completed = update.current_week_days_completed.clone();
            goal.is_daily_goal_completed = completed_today;
            goal.last_completed_date = update.last_completed_date.clone();
            if update.current_week_start.is_some() {
                goal.current_week_start = update.current_week_start.clone();
            }
            goal.normalize_week();
        }
        inner.last_error = None;
        if let Some(identity) = inner.identity.clone() {
            self.write_cache(&inner, &identity);
        }
    }

    fn record_failure(&self, title: &str, err: &StudyError) {
        warn!("{title}: {}", err.message);
        self.lock().last_error = Some(err.message.clone());
        self.events
            .emit(StoreEvent::error("Error", format!("{title}: {}", err.message)));
    }

    fn cache_key(identity: &str) -> String {
        format!("studytrack-goals-{identity}")
    }

    fn write_cache(&self, inner: &Inner, identity: &str) {
        match serde_json::to_string(&inner.goals) {
            Ok(payload) => self.cache.set(&Self::cache_key(identity), &payload),
            Err(err) => warn!("failed to serialize goal cache: {err}"),
        }
    }

    fn hydrate_from_cache(&self, inner: &mut Inner, identity: &str) {
        let Some(raw) = self.cache.get(&Self::cache_key(identity)) else {
            return;
        };
        match serde_json::from_str::<HashMap<Category, Goal>>(&raw) {
            Ok(mut goals) => {
                for goal in goals.values_mut() {
                    goal.normalize_week();
                }
                debug!("hydrated {} goals from cache", goals.len());
                inner.goals = goals;
            }
            Err(err) => warn!("failed to parse cached goals: {err}"),
        }
    }
}

fn bump_generation(inner: &mut Inner, category: Category) -> u64 {
    let entry = inner.generations.entry(category).or_insert(0);
    *entry += 1;
    *entry
}

fn generation_current(inner: &Inner, category: Category, generation: u64) -> bool {
    inner.generations.get(&category) == Some(&generation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_tokens_are_per_category() {
        let mut inner = Inner::default();
        let a1 = bump_generation(&mut inner, Category::Algorithms);
        let d1 = bump_generation(&mut inner, Category::Development);
        let a2 = bump_generation(&mut inner, Category::Algorithms);
        assert_eq!((a1, d1, a2), (1, 1, 2));
        assert!(!generation_current(&inner, Category::Algorithms, a1));
        assert!(generation_current(&inner, Category::Algorithms, a2));
        assert!(generation_current(&inner, Category::Development, d1));
    }

    #[test]
    fn goal_cache_key_is_identity_scoped() {
        assert_eq!(GoalStore::cache_key("u1"), "studytrack-goals-u1");
        assert_ne!(GoalStore::cache_key("u1"), GoalStore::cache_key("u2"));
    }
}
