use chrono::{DateTime, Utc};
use std::fmt;

use training_core::model::{
    AnswerRecord, Difficulty, Question, SessionNumber, SessionOutcome,
};

use super::progress::SessionProgress;
use crate::error::SessionError;

/// In-memory state machine for one practice session.
///
/// Steps through the built question list sequentially, computing correctness
/// for each selection against the question's correct index. The surrounding
/// quiz UI owns rendering and input; this type owns the answer bookkeeping
/// the recorder later consumes.
pub struct SessionService {
    session_number: SessionNumber,
    difficulty: Difficulty,
    questions: Vec<Question>,
    current: usize,
    answers: Vec<AnswerRecord>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl SessionService {
    /// Create a session over the given questions.
    ///
    /// `started_at` should come from the services layer clock to keep time
    /// deterministic.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided.
    pub fn new(
        session_number: SessionNumber,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }

        Ok(Self {
            session_number,
            difficulty: Difficulty::for_session(session_number),
            questions,
            current: 0,
            answers: Vec::new(),
            started_at,
            completed_at: None,
        })
    }

    #[must_use]
    pub fn session_number(&self) -> SessionNumber {
        self.session_number
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    /// Total number of questions in this session.
    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// Number of questions that have already been answered.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Number of remaining unanswered questions.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.questions.len().saturating_sub(self.current)
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.total_questions(),
            answered: self.answered_count(),
            remaining: self.remaining(),
            is_complete: self.is_complete(),
        }
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Record an answer for the current question and advance.
    ///
    /// `selected` is the chosen option index, or `None` for a skipped
    /// question; anything that does not match the correct index counts as
    /// incorrect. `answered_at` should come from the services layer clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session is already finished.
    pub fn answer_current(
        &mut self,
        selected: Option<usize>,
        answered_at: DateTime<Utc>,
    ) -> Result<&AnswerRecord, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        let Some(question) = self.questions.get(self.current) else {
            return Err(SessionError::Completed);
        };

        let is_correct = selected.is_some_and(|index| question.is_correct(index));
        self.answers.push(AnswerRecord {
            question_id: question.id().clone(),
            selected,
            is_correct,
        });

        self.current += 1;
        if self.current >= self.questions.len() {
            self.completed_at = Some(answered_at);
        }

        self.answers.last().ok_or(SessionError::Completed)
    }

    /// The raw outcome of a finished session, ready for the recorder.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Incomplete` while questions remain unanswered.
    pub fn outcome(&self) -> Result<SessionOutcome, SessionError> {
        let completed_at = self.completed_at.ok_or(SessionError::Incomplete)?;
        let elapsed = (completed_at - self.started_at).num_seconds().max(0);
        let time_spent_secs = u32::try_from(elapsed).unwrap_or(u32::MAX);

        Ok(SessionOutcome {
            answers: self.answers.clone(),
            time_spent_secs,
        })
    }
}

impl fmt::Debug for SessionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionService")
            .field("session_number", &self.session_number)
            .field("difficulty", &self.difficulty)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answers_len", &self.answers.len())
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}
