use std::collections::BTreeSet;
use std::sync::Arc;

use storage::repository::{
    ProgressRepository, QuestionRepository, ScoreRepository, SessionResultRepository, Storage,
};
use training_core::model::{
    Difficulty, PracticeSets, ProgressCursor, SessionNumber, SessionOutcome, SessionRecord,
    UserId, unlocked_sessions,
};

use super::queries::SessionQueries;
use super::service::SessionService;
use crate::Clock;
use crate::error::SessionError;

/// Orchestrates session start and result recording against storage.
#[derive(Clone)]
pub struct SessionWorkflow {
    clock: Clock,
    questions: Arc<dyn QuestionRepository>,
    scores: Arc<dyn ScoreRepository>,
    results: Arc<dyn SessionResultRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl SessionWorkflow {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionRepository>,
        scores: Arc<dyn ScoreRepository>,
        results: Arc<dyn SessionResultRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            questions,
            scores,
            results,
            progress,
        }
    }

    /// Convenience constructor over a `Storage` aggregate.
    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.questions),
            Arc::clone(&storage.scores),
            Arc::clone(&storage.results),
            Arc::clone(&storage.progress),
        )
    }

    /// Fetch the user's progress cursor, creating and persisting the initial
    /// one on first access.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn ensure_progress(&self, user: &UserId) -> Result<ProgressCursor, SessionError> {
        if let Some(cursor) = self.progress.get_progress(user).await? {
            return Ok(cursor);
        }
        let cursor = ProgressCursor::initial(self.clock.now());
        self.progress.put_progress(user, &cursor).await?;
        Ok(cursor)
    }

    /// Sessions the user may start, derived from the cursor's completed set.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn unlocked_sessions(
        &self,
        user: &UserId,
    ) -> Result<BTreeSet<SessionNumber>, SessionError> {
        let cursor = self.ensure_progress(user).await?;
        Ok(unlocked_sessions(&cursor.completed_set()))
    }

    /// Start a session: load scores and the difficulty's question pool,
    /// build the plan, and return the runnable session plus the practice
    /// sets the recorder resolves against.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are available for the
    /// session's difficulty, or `SessionError::Storage` on repository
    /// failures.
    pub async fn start_session(
        &self,
        user: &UserId,
        session_number: SessionNumber,
    ) -> Result<(PracticeSets, SessionService), SessionError> {
        let now = self.clock.now();
        SessionQueries::start_from_storage(
            user,
            session_number,
            self.scores.as_ref(),
            self.questions.as_ref(),
            now,
        )
        .await
    }

    /// Record a completed session and advance the user's progress cursor.
    ///
    /// Resolves each answer against `sets` at the session's difficulty
    /// (answers referencing unknown questions are skipped), persists the
    /// result record keyed `(user, session_number)` with overwrite
    /// semantics, then persists the advanced cursor and returns it.
    ///
    /// The two writes are sequential and not atomic: if the cursor write
    /// fails after the result write succeeded, the stored result remains and
    /// the cursor keeps its previous value. Neither write is retried here;
    /// the caller decides whether to re-run the whole call, which overwrites
    /// the result and recomputes the cursor from `session_number`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when either write fails.
    pub async fn record_session(
        &self,
        user: &UserId,
        session_number: SessionNumber,
        outcome: &SessionOutcome,
        sets: &PracticeSets,
    ) -> Result<ProgressCursor, SessionError> {
        let difficulty = Difficulty::for_session(session_number);
        let record =
            SessionRecord::from_answers(outcome, sets.get(difficulty), self.clock.now());
        self.results.put_result(user, session_number, &record).await?;

        let cursor = ProgressCursor::after_session(session_number, self.clock.now());
        self.progress.put_progress(user, &cursor).await?;

        Ok(cursor)
    }

    /// Derive the outcome from a finished session and record it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Incomplete` if the session still has
    /// unanswered questions, or any error from
    /// [`SessionWorkflow::record_session`].
    pub async fn finish_session(
        &self,
        user: &UserId,
        session: &SessionService,
        sets: &PracticeSets,
    ) -> Result<ProgressCursor, SessionError> {
        let outcome = session.outcome()?;
        self.record_session(user, session.session_number(), &outcome, sets)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;
    use training_core::model::{AnswerRecord, Question, QuestionId, SubjectName};
    use training_core::time::{fixed_clock, fixed_now};

    fn workflow(repo: &InMemoryRepository) -> SessionWorkflow {
        SessionWorkflow::new(
            fixed_clock(),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
    }

    fn question(id: &str, subject: &str) -> Question {
        Question::from_persisted(
            QuestionId::new(id),
            SubjectName::new(subject).unwrap(),
            format!("prompt {id}"),
            vec!["a".into(), "b".into()],
            0,
            None,
            Difficulty::Easy,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn ensure_progress_bootstraps_the_cursor() {
        let repo = InMemoryRepository::new();
        let svc = workflow(&repo);
        let user = UserId::new("u1");

        let cursor = svc.ensure_progress(&user).await.unwrap();
        assert_eq!(cursor.current_session(), 1);
        assert_eq!(cursor.completed_sessions(), 0);

        // Persisted, not just returned.
        use storage::repository::ProgressRepository as _;
        let stored = repo.get_progress(&user).await.unwrap().unwrap();
        assert_eq!(stored, cursor);
    }

    #[tokio::test]
    async fn record_session_persists_record_and_advances_cursor() {
        let repo = InMemoryRepository::new();
        let svc = workflow(&repo);
        let user = UserId::new("u1");
        let session_number = SessionNumber::new(2).unwrap();

        let sets = PracticeSets::only(
            Difficulty::Easy,
            vec![question("q1", "algebra"), question("q2", "geometry")],
        );
        let outcome = SessionOutcome {
            answers: vec![
                AnswerRecord {
                    question_id: QuestionId::new("q1"),
                    selected: Some(0),
                    is_correct: true,
                },
                AnswerRecord {
                    question_id: QuestionId::new("q2"),
                    selected: Some(1),
                    is_correct: false,
                },
            ],
            time_spent_secs: 180,
        };

        let cursor = svc
            .record_session(&user, session_number, &outcome, &sets)
            .await
            .unwrap();
        assert_eq!(cursor.current_session(), 3);
        assert_eq!(cursor.completed_sessions(), 2);
        assert!(!cursor.is_complete());

        use storage::repository::SessionResultRepository as _;
        let stored = repo.get_result(&user, session_number).await.unwrap().unwrap();
        assert_eq!(stored.time_spent_secs(), 180);
        assert_eq!(stored.completed_at(), fixed_now());
        assert_eq!(stored.breakdown().total_questions(), 2);
        assert_eq!(stored.breakdown().total_correct(), 1);
        assert_eq!(stored.mistakes().len(), 1);
    }

    #[tokio::test]
    async fn recording_is_breakdown_idempotent() {
        let repo = InMemoryRepository::new();
        let svc = workflow(&repo);
        let user = UserId::new("u1");
        let session_number = SessionNumber::new(1).unwrap();

        let sets = PracticeSets::only(Difficulty::Easy, vec![question("q1", "algebra")]);
        let outcome = SessionOutcome {
            answers: vec![AnswerRecord {
                question_id: QuestionId::new("q1"),
                selected: Some(0),
                is_correct: true,
            }],
            time_spent_secs: 60,
        };

        svc.record_session(&user, session_number, &outcome, &sets)
            .await
            .unwrap();
        use storage::repository::SessionResultRepository as _;
        let first = repo.get_result(&user, session_number).await.unwrap().unwrap();

        svc.record_session(&user, session_number, &outcome, &sets)
            .await
            .unwrap();
        let second = repo.get_result(&user, session_number).await.unwrap().unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn recording_session_nine_completes_the_plan() {
        let repo = InMemoryRepository::new();
        let svc = workflow(&repo);
        let user = UserId::new("u1");
        let session_number = SessionNumber::new(9).unwrap();

        let sets = PracticeSets::only(Difficulty::Hard, Vec::new());
        let outcome = SessionOutcome {
            answers: Vec::new(),
            time_spent_secs: 0,
        };

        let cursor = svc
            .record_session(&user, session_number, &outcome, &sets)
            .await
            .unwrap();
        assert_eq!(cursor.current_session(), 10);
        assert!(cursor.is_complete());
    }

    #[tokio::test]
    async fn unlocked_sessions_follow_the_cursor() {
        let repo = InMemoryRepository::new();
        let svc = workflow(&repo);
        let user = UserId::new("u1");

        let open = svc.unlocked_sessions(&user).await.unwrap();
        assert_eq!(open.len(), 1);
        assert!(open.contains(&SessionNumber::new(1).unwrap()));

        let sets = PracticeSets::only(Difficulty::Easy, vec![question("q1", "algebra")]);
        let outcome = SessionOutcome {
            answers: vec![AnswerRecord {
                question_id: QuestionId::new("q1"),
                selected: Some(0),
                is_correct: true,
            }],
            time_spent_secs: 45,
        };
        svc.record_session(&user, SessionNumber::new(1).unwrap(), &outcome, &sets)
            .await
            .unwrap();

        let open = svc.unlocked_sessions(&user).await.unwrap();
        let values: Vec<u8> = open.iter().map(SessionNumber::value).collect();
        assert_eq!(values, vec![1, 2, 4]);
    }
}
