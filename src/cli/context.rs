use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;

use crate::api::{session_path, Backend, HttpBackend, Session};
use crate::config::{cache_dir, home_dir, Config};
use crate::error::StudyError;
use crate::models::User;
use crate::store::{EventSink, FileCache, GoalStore, StoreEvent, TaskStore};

/// Everything a command needs: the HTTP backend, both stores wired to it
/// and to each other, and the event receiver for store notifications.
pub struct AppContext {
    pub backend: Arc<HttpBackend>,
    pub goals: Arc<GoalStore>,
    pub tasks: Arc<TaskStore>,
    events: Receiver<StoreEvent>,
}

impl AppContext {
    pub fn load() -> Result<Self, StudyError> {
        let config = Config::load()?;
        let home = home_dir()?;
        let session_file = session_path(&home);
        let session = Session::load(&session_file);

        let backend = Arc::new(HttpBackend::new(
            config.api_url,
            session,
            Some(session_file),
        )?);
        let cache = Arc::new(FileCache::new(cache_dir()?));
        let (tx, rx) = channel();

        let backend_dyn: Arc<dyn Backend> = backend.clone();
        let goals = Arc::new(GoalStore::new(
            backend_dyn.clone(),
            cache.clone(),
            EventSink::new(tx.clone()),
        ));
        let tasks = Arc::new(TaskStore::new(
            backend_dyn,
            cache,
            goals.clone(),
            EventSink::new(tx),
        ));

        let ctx = Self {
            backend,
            goals,
            tasks,
            events: rx,
        };
        ctx.adopt_identity(ctx.backend.current_user());
        Ok(ctx)
    }

    /// Point both stores at the given identity (or clear them).
    pub fn adopt_identity(&self, user: Option<User>) {
        let key = user.map(|u| u.identity_key().to_string());
        self.goals.set_identity(key.clone());
        self.tasks.set_identity(key);
    }

    /// The signed-in user, or an error directing the user to `login`.
    pub fn require_user(&self) -> Result<User, StudyError> {
        self.backend.current_user().ok_or_else(StudyError::not_signed_in)
    }

    /// Store notifications raised so far, in order.
    pub fn drain_events(&self) -> Vec<StoreEvent> {
        self.events.try_iter().collect()
    }
}
