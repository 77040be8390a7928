use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use training_core::model::{
    Difficulty, ProgressCursor, QuestionDraft, QuestionId, ScoreSheet, SessionNumber,
    SessionRecord, SubjectName, UserId,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape of a question document.
///
/// This mirrors what the external question bank actually stores (split
/// correct/incorrect answers, three possible prompt fields) so repositories
/// can round-trip documents without leaking normalization into the domain
/// layer. Normalizing into a domain `Question` happens through
/// [`QuestionRecord::into_draft`] at the services layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    pub id: QuestionId,
    pub subject: SubjectName,
    pub question_text: Option<String>,
    pub question: Option<String>,
    pub question_text_legacy: Option<String>,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
    pub explanation: Option<String>,
    pub difficulty: Difficulty,
}

impl QuestionRecord {
    /// Convert the record into a domain draft ready for validation.
    #[must_use]
    pub fn into_draft(self) -> QuestionDraft {
        QuestionDraft {
            id: self.id,
            subject: self.subject,
            question_text: self.question_text,
            question: self.question,
            question_text_legacy: self.question_text_legacy,
            correct_answer: self.correct_answer,
            incorrect_answers: self.incorrect_answers,
            explanation: self.explanation,
            difficulty: self.difficulty,
        }
    }
}

/// A stored session result together with its session number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResultRow {
    pub session: SessionNumber,
    pub record: SessionRecord,
}

impl SessionResultRow {
    #[must_use]
    pub fn new(session: SessionNumber, record: SessionRecord) -> Self {
        Self { session, record }
    }
}

/// Read access to the question bank. Writes exist for seeding and tests;
/// the session flows never mutate questions.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Persist or update a question document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn upsert_question(&self, record: &QuestionRecord) -> Result<(), StorageError>;

    /// All questions of one difficulty, ordered by document id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_by_difficulty(
        &self,
        difficulty: Difficulty,
    ) -> Result<Vec<QuestionRecord>, StorageError>;
}

/// Per-user diagnostic grades.
#[async_trait]
pub trait ScoreRepository: Send + Sync {
    /// Persist or update one subject grade for a user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the grade cannot be stored.
    async fn upsert_score(
        &self,
        user: &UserId,
        subject: &SubjectName,
        grade: f64,
    ) -> Result<(), StorageError>;

    /// A user's grades in subject-name order (the order the original score
    /// source returned its documents).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn get_scores(&self, user: &UserId) -> Result<ScoreSheet, StorageError>;
}

/// Per-user, per-session result documents.
#[async_trait]
pub trait SessionResultRepository: Send + Sync {
    /// Write a session result, replacing any previous result for the same
    /// `(user, session)` key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn put_result(
        &self,
        user: &UserId,
        session: SessionNumber,
        record: &SessionRecord,
    ) -> Result<(), StorageError>;

    /// Fetch one stored result, if present.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn get_result(
        &self,
        user: &UserId,
        session: SessionNumber,
    ) -> Result<Option<SessionRecord>, StorageError>;

    /// All stored results for a user, most recently completed first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_results(&self, user: &UserId) -> Result<Vec<SessionResultRow>, StorageError>;
}

/// The per-user progress cursor singleton.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the user's cursor, if one has been created.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn get_progress(&self, user: &UserId) -> Result<Option<ProgressCursor>, StorageError>;

    /// Write the user's cursor, overwriting the previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cursor cannot be stored.
    async fn put_progress(
        &self,
        user: &UserId,
        cursor: &ProgressCursor,
    ) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<BTreeMap<QuestionId, QuestionRecord>>>,
    scores: Arc<Mutex<BTreeMap<(UserId, SubjectName), f64>>>,
    results: Arc<Mutex<HashMap<(UserId, u8), SessionRecord>>>,
    progress: Arc<Mutex<HashMap<UserId, ProgressCursor>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_err<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn upsert_question(&self, record: &QuestionRecord) -> Result<(), StorageError> {
        let mut guard = self.questions.lock().map_err(lock_err)?;
        guard.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn list_by_difficulty(
        &self,
        difficulty: Difficulty,
    ) -> Result<Vec<QuestionRecord>, StorageError> {
        let guard = self.questions.lock().map_err(lock_err)?;
        Ok(guard
            .values()
            .filter(|record| record.difficulty == difficulty)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ScoreRepository for InMemoryRepository {
    async fn upsert_score(
        &self,
        user: &UserId,
        subject: &SubjectName,
        grade: f64,
    ) -> Result<(), StorageError> {
        let mut guard = self.scores.lock().map_err(lock_err)?;
        guard.insert((user.clone(), subject.clone()), grade);
        Ok(())
    }

    async fn get_scores(&self, user: &UserId) -> Result<ScoreSheet, StorageError> {
        let guard = self.scores.lock().map_err(lock_err)?;
        Ok(guard
            .iter()
            .filter(|((u, _), _)| u == user)
            .map(|((_, subject), grade)| (subject.clone(), *grade))
            .collect())
    }
}

#[async_trait]
impl SessionResultRepository for InMemoryRepository {
    async fn put_result(
        &self,
        user: &UserId,
        session: SessionNumber,
        record: &SessionRecord,
    ) -> Result<(), StorageError> {
        let mut guard = self.results.lock().map_err(lock_err)?;
        guard.insert((user.clone(), session.value()), record.clone());
        Ok(())
    }

    async fn get_result(
        &self,
        user: &UserId,
        session: SessionNumber,
    ) -> Result<Option<SessionRecord>, StorageError> {
        let guard = self.results.lock().map_err(lock_err)?;
        Ok(guard.get(&(user.clone(), session.value())).cloned())
    }

    async fn list_results(&self, user: &UserId) -> Result<Vec<SessionResultRow>, StorageError> {
        let guard = self.results.lock().map_err(lock_err)?;
        let mut rows = Vec::new();
        for ((u, number), record) in guard.iter() {
            if u != user {
                continue;
            }
            let session = SessionNumber::new(*number)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            rows.push(SessionResultRow::new(session, record.clone()));
        }
        rows.sort_by(|a, b| {
            b.record
                .completed_at()
                .cmp(&a.record.completed_at())
                .then(b.session.cmp(&a.session))
        });
        Ok(rows)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(&self, user: &UserId) -> Result<Option<ProgressCursor>, StorageError> {
        let guard = self.progress.lock().map_err(lock_err)?;
        Ok(guard.get(user).copied())
    }

    async fn put_progress(
        &self,
        user: &UserId,
        cursor: &ProgressCursor,
    ) -> Result<(), StorageError> {
        let mut guard = self.progress.lock().map_err(lock_err)?;
        guard.insert(user.clone(), *cursor);
        Ok(())
    }
}

/// Aggregates the four repositories behind trait objects for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub scores: Arc<dyn ScoreRepository>,
    pub results: Arc<dyn SessionResultRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            questions: Arc::new(repo.clone()),
            scores: Arc::new(repo.clone()),
            results: Arc::new(repo.clone()),
            progress: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use training_core::model::{AnswerRecord, SessionOutcome};
    use training_core::time::fixed_now;

    fn subject(name: &str) -> SubjectName {
        SubjectName::new(name).unwrap()
    }

    fn question_record(id: &str, subject_name: &str, difficulty: Difficulty) -> QuestionRecord {
        QuestionRecord {
            id: QuestionId::new(id),
            subject: subject(subject_name),
            question_text: Some(format!("prompt {id}")),
            question: None,
            question_text_legacy: None,
            correct_answer: "right".into(),
            incorrect_answers: vec!["wrong a".into(), "wrong b".into()],
            explanation: None,
            difficulty,
        }
    }

    fn build_record(time_spent_secs: u32) -> SessionRecord {
        let question = question_record("q1", "algebra", Difficulty::Easy)
            .into_draft()
            .validate(0)
            .unwrap();
        let outcome = SessionOutcome {
            answers: vec![AnswerRecord {
                question_id: QuestionId::new("q1"),
                selected: Some(0),
                is_correct: true,
            }],
            time_spent_secs,
        };
        SessionRecord::from_answers(&outcome, &[question], fixed_now())
    }

    #[tokio::test]
    async fn questions_filter_by_difficulty_in_id_order() {
        let repo = InMemoryRepository::new();
        repo.upsert_question(&question_record("b", "algebra", Difficulty::Easy))
            .await
            .unwrap();
        repo.upsert_question(&question_record("a", "geometry", Difficulty::Easy))
            .await
            .unwrap();
        repo.upsert_question(&question_record("c", "algebra", Difficulty::Hard))
            .await
            .unwrap();

        let easy = repo.list_by_difficulty(Difficulty::Easy).await.unwrap();
        assert_eq!(easy.len(), 2);
        assert_eq!(easy[0].id, QuestionId::new("a"));
        assert_eq!(easy[1].id, QuestionId::new("b"));
    }

    #[tokio::test]
    async fn scores_come_back_in_subject_order() {
        let repo = InMemoryRepository::new();
        let user = UserId::new("u1");
        repo.upsert_score(&user, &subject("trig"), 70.0)
            .await
            .unwrap();
        repo.upsert_score(&user, &subject("algebra"), 30.0)
            .await
            .unwrap();
        repo.upsert_score(&UserId::new("u2"), &subject("algebra"), 99.0)
            .await
            .unwrap();

        let sheet = repo.get_scores(&user).await.unwrap();
        let subjects: Vec<_> = sheet.iter().map(|s| s.subject.clone()).collect();
        assert_eq!(subjects, vec![subject("algebra"), subject("trig")]);
        assert_eq!(sheet.grade(&subject("algebra")), Some(30.0));
    }

    #[tokio::test]
    async fn result_put_overwrites_previous_value() {
        let repo = InMemoryRepository::new();
        let user = UserId::new("u1");
        let session = SessionNumber::new(2).unwrap();

        repo.put_result(&user, session, &build_record(10))
            .await
            .unwrap();
        repo.put_result(&user, session, &build_record(99))
            .await
            .unwrap();

        let stored = repo.get_result(&user, session).await.unwrap().unwrap();
        assert_eq!(stored.time_spent_secs(), 99);
    }

    #[tokio::test]
    async fn progress_round_trips_and_overwrites() {
        let repo = InMemoryRepository::new();
        let user = UserId::new("u1");
        assert!(repo.get_progress(&user).await.unwrap().is_none());

        let initial = ProgressCursor::initial(fixed_now());
        repo.put_progress(&user, &initial).await.unwrap();
        let advanced =
            ProgressCursor::after_session(SessionNumber::new(1).unwrap(), fixed_now());
        repo.put_progress(&user, &advanced).await.unwrap();

        let stored = repo.get_progress(&user).await.unwrap().unwrap();
        assert_eq!(stored.current_session(), 2);
    }
}
