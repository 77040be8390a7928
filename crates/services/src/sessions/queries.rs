use chrono::{DateTime, Utc};
use rand::{Rng, rng};

use storage::repository::{QuestionRecord, QuestionRepository, ScoreRepository};
use training_core::model::{
    Difficulty, PracticeSets, Question, ScoreSheet, SessionNumber, UserId,
};

use super::plan::{SessionBuilder, SessionPlan};
use super::service::SessionService;
use crate::error::SessionError;

/// Storage-backed session queries and builders.
pub(crate) struct SessionQueries;

impl SessionQueries {
    /// Normalize raw question records into validated domain questions.
    ///
    /// Each record's correct answer is inserted at a randomly chosen slot in
    /// the option list so it does not always occupy the same position.
    /// Records that fail validation (no prompt text, blank correct answer)
    /// are dropped; a stale or half-migrated question bank shrinks the pool
    /// instead of failing the load.
    pub(crate) fn normalize_questions(records: Vec<QuestionRecord>) -> Vec<Question> {
        let mut rng = rng();
        records
            .into_iter()
            .filter_map(|record| {
                let draft = record.into_draft();
                let position = rng.random_range(0..draft.option_count());
                draft.validate(position).ok()
            })
            .collect()
    }

    /// Load and normalize the question pool for one difficulty.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when repository access fails.
    pub(crate) async fn load_pool(
        questions: &dyn QuestionRepository,
        difficulty: Difficulty,
    ) -> Result<Vec<Question>, SessionError> {
        let records = questions.list_by_difficulty(difficulty).await?;
        Ok(Self::normalize_questions(records))
    }

    /// Build a session plan for a user from repository data.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when repository access fails.
    pub(crate) async fn build_plan_from_storage(
        user: &UserId,
        session_number: SessionNumber,
        scores: &dyn ScoreRepository,
        questions: &dyn QuestionRepository,
    ) -> Result<SessionPlan, SessionError> {
        let sheet: ScoreSheet = scores.get_scores(user).await?;
        let difficulty = Difficulty::for_session(session_number);
        let pool = Self::load_pool(questions, difficulty).await?;
        Ok(SessionBuilder::new().build(&sheet, &pool))
    }

    /// Create a runnable session directly from storage-backed data, together
    /// with the practice sets the recorder will later resolve against.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the plan comes out empty, or
    /// `SessionError::Storage` on repository failures.
    pub(crate) async fn start_from_storage(
        user: &UserId,
        session_number: SessionNumber,
        scores: &dyn ScoreRepository,
        questions: &dyn QuestionRepository,
        now: DateTime<Utc>,
    ) -> Result<(PracticeSets, SessionService), SessionError> {
        let plan =
            Self::build_plan_from_storage(user, session_number, scores, questions).await?;
        let difficulty = Difficulty::for_session(session_number);
        let sets = PracticeSets::only(difficulty, plan.questions.clone());
        let session = SessionService::new(session_number, plan.questions, now)?;
        Ok((sets, session))
    }
}
