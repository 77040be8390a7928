use std::sync::Arc;

use chrono::{DateTime, Utc};

use storage::repository::{ProgressRepository, SessionResultRepository, Storage};
use training_core::model::{Difficulty, ProgressCursor, SessionNumber, UserId};

use crate::error::SessionError;

/// One stored session result prepared for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResultListItem {
    pub session_number: SessionNumber,
    pub difficulty: Difficulty,
    pub total_questions: u32,
    pub correct: u32,
    pub mistakes: usize,
    pub time_spent_secs: u32,
    pub completed_at: DateTime<Utc>,
}

/// Read-side service for the training history screens.
#[derive(Clone)]
pub struct TrainingOverview {
    results: Arc<dyn SessionResultRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl TrainingOverview {
    #[must_use]
    pub fn new(
        results: Arc<dyn SessionResultRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self { results, progress }
    }

    /// Convenience constructor over a `Storage` aggregate.
    #[must_use]
    pub fn from_storage(storage: &Storage) -> Self {
        Self::new(Arc::clone(&storage.results), Arc::clone(&storage.progress))
    }

    /// The user's stored session results, most recently completed first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn list_results(
        &self,
        user: &UserId,
    ) -> Result<Vec<SessionResultListItem>, SessionError> {
        let rows = self.results.list_results(user).await?;
        Ok(rows
            .into_iter()
            .map(|row| SessionResultListItem {
                session_number: row.session,
                difficulty: Difficulty::for_session(row.session),
                total_questions: row.record.breakdown().total_questions(),
                correct: row.record.breakdown().total_correct(),
                mistakes: row.record.mistakes().len(),
                time_spent_secs: row.record.time_spent_secs(),
                completed_at: row.record.completed_at(),
            })
            .collect())
    }

    /// The user's progress cursor, if one exists yet.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn cursor(&self, user: &UserId) -> Result<Option<ProgressCursor>, SessionError> {
        Ok(self.progress.get_progress(user).await?)
    }
}
