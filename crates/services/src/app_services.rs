use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::sessions::{SessionWorkflow, TrainingOverview};

/// Assembles the app-facing services over a shared storage backend.
#[derive(Clone)]
pub struct AppServices {
    workflow: Arc<SessionWorkflow>,
    overview: Arc<TrainingOverview>,
}

impl AppServices {
    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self {
            workflow: Arc::new(SessionWorkflow::from_storage(clock, storage)),
            overview: Arc::new(TrainingOverview::from_storage(storage)),
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(clock, &storage))
    }

    /// Build services over in-memory storage, for tests and prototyping.
    #[must_use]
    pub fn new_in_memory(clock: Clock) -> Self {
        Self::from_storage(clock, &Storage::in_memory())
    }

    #[must_use]
    pub fn workflow(&self) -> Arc<SessionWorkflow> {
        Arc::clone(&self.workflow)
    }

    #[must_use]
    pub fn overview(&self) -> Arc<TrainingOverview> {
        Arc::clone(&self.overview)
    }
}
