use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::{Difficulty, Question, QuestionId, SubjectName};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionRecordError {
    #[error("subject {subject}: correct count {correct} exceeds attempted {questions}")]
    CountInvariant {
        subject: String,
        questions: u32,
        correct: u32,
    },
}

/// One answered (or skipped) question from a completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    /// Option index the user selected; `None` when the question was skipped.
    pub selected: Option<usize>,
    pub is_correct: bool,
}

/// A wrong or skipped answer, kept for post-session review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mistake {
    pub question_id: QuestionId,
    pub user_answer: Option<usize>,
}

/// Attempted/correct counters for one subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubjectTally {
    questions: u32,
    correct: u32,
}

impl SubjectTally {
    #[must_use]
    pub fn questions(&self) -> u32 {
        self.questions
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }
}

/// Per-subject attempted/correct counters for one session.
///
/// `correct <= questions` holds for every subject: accumulation can only
/// increment both together, and rehydration re-checks the pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectBreakdown {
    tallies: BTreeMap<SubjectName, SubjectTally>,
}

impl SubjectBreakdown {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one attempt for `subject`, and one correct answer when
    /// `correct` is set.
    pub fn record(&mut self, subject: &SubjectName, correct: bool) {
        let tally = self.tallies.entry(subject.clone()).or_default();
        tally.questions = tally.questions.saturating_add(1);
        if correct {
            tally.correct = tally.correct.saturating_add(1);
        }
    }

    /// Rehydrate a breakdown from persisted per-subject counters.
    ///
    /// # Errors
    ///
    /// Returns `SessionRecordError::CountInvariant` if any subject claims
    /// more correct answers than attempts.
    pub fn from_persisted_parts(
        parts: impl IntoIterator<Item = (SubjectName, u32, u32)>,
    ) -> Result<Self, SessionRecordError> {
        let mut tallies = BTreeMap::new();
        for (subject, questions, correct) in parts {
            if correct > questions {
                return Err(SessionRecordError::CountInvariant {
                    subject: subject.as_str().to_string(),
                    questions,
                    correct,
                });
            }
            tallies.insert(subject, SubjectTally { questions, correct });
        }
        Ok(Self { tallies })
    }

    #[must_use]
    pub fn get(&self, subject: &SubjectName) -> Option<&SubjectTally> {
        self.tallies.get(subject)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SubjectName, &SubjectTally)> {
        self.tallies.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.tallies.values().map(SubjectTally::questions).sum()
    }

    #[must_use]
    pub fn total_correct(&self) -> u32 {
        self.tallies.values().map(SubjectTally::correct).sum()
    }
}

/// Raw output of a finished session: the answers plus elapsed time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub answers: Vec<AnswerRecord>,
    pub time_spent_secs: u32,
}

/// Immutable result document for one completed session, keyed externally by
/// `(user, session number)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    time_spent_secs: u32,
    breakdown: SubjectBreakdown,
    mistakes: Vec<Mistake>,
    completed_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Build a record by resolving each answer against the session's
    /// question set.
    ///
    /// Answers referencing a question id not present in `questions` are
    /// skipped rather than failing the whole session; question sets can be
    /// stale across deployments.
    #[must_use]
    pub fn from_answers(
        outcome: &SessionOutcome,
        questions: &[Question],
        completed_at: DateTime<Utc>,
    ) -> Self {
        let mut breakdown = SubjectBreakdown::new();
        let mut mistakes = Vec::new();

        for answer in &outcome.answers {
            let Some(question) = questions.iter().find(|q| q.id() == &answer.question_id) else {
                continue;
            };

            breakdown.record(question.subject(), answer.is_correct);
            if !answer.is_correct {
                mistakes.push(Mistake {
                    question_id: answer.question_id.clone(),
                    user_answer: answer.selected,
                });
            }
        }

        Self {
            time_spent_secs: outcome.time_spent_secs,
            breakdown,
            mistakes,
            completed_at,
        }
    }

    /// Reassemble a record from persisted storage. The breakdown is expected
    /// to come from [`SubjectBreakdown::from_persisted_parts`], which owns
    /// the counter invariant.
    #[must_use]
    pub fn from_persisted(
        time_spent_secs: u32,
        breakdown: SubjectBreakdown,
        mistakes: Vec<Mistake>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            time_spent_secs,
            breakdown,
            mistakes,
            completed_at,
        }
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u32 {
        self.time_spent_secs
    }

    #[must_use]
    pub fn breakdown(&self) -> &SubjectBreakdown {
        &self.breakdown
    }

    #[must_use]
    pub fn mistakes(&self) -> &[Mistake] {
        &self.mistakes
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

/// Per-difficulty question lists for the session currently being taken.
///
/// Mirrors the shape the recorder receives: answers are resolved against the
/// set matching the session's difficulty only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PracticeSets {
    easy: Vec<Question>,
    medium: Vec<Question>,
    hard: Vec<Question>,
}

impl PracticeSets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets with questions under a single difficulty and the rest empty.
    #[must_use]
    pub fn only(difficulty: Difficulty, questions: Vec<Question>) -> Self {
        let mut sets = Self::new();
        sets.replace(difficulty, questions);
        sets
    }

    pub fn replace(&mut self, difficulty: Difficulty, questions: Vec<Question>) {
        match difficulty {
            Difficulty::Easy => self.easy = questions,
            Difficulty::Medium => self.medium = questions,
            Difficulty::Hard => self.hard = questions,
        }
    }

    #[must_use]
    pub fn get(&self, difficulty: Difficulty) -> &[Question] {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn subject(name: &str) -> SubjectName {
        SubjectName::new(name).unwrap()
    }

    fn question(id: &str, subject_name: &str, correct: usize) -> Question {
        Question::from_persisted(
            QuestionId::new(id),
            subject(subject_name),
            format!("prompt {id}"),
            vec!["a".into(), "b".into(), "c".into()],
            correct,
            None,
            Difficulty::Easy,
        )
        .unwrap()
    }

    fn answer(id: &str, selected: Option<usize>, is_correct: bool) -> AnswerRecord {
        AnswerRecord {
            question_id: QuestionId::new(id),
            selected,
            is_correct,
        }
    }

    #[test]
    fn record_accumulates_breakdown_and_mistakes() {
        let questions = vec![
            question("q1", "algebra", 0),
            question("q2", "algebra", 1),
            question("q3", "geometry", 2),
        ];
        let outcome = SessionOutcome {
            answers: vec![
                answer("q1", Some(0), true),
                answer("q2", Some(0), false),
                answer("q3", None, false),
            ],
            time_spent_secs: 120,
        };

        let record = SessionRecord::from_answers(&outcome, &questions, fixed_now());

        let algebra = record.breakdown().get(&subject("algebra")).unwrap();
        assert_eq!(algebra.questions(), 2);
        assert_eq!(algebra.correct(), 1);

        let geometry = record.breakdown().get(&subject("geometry")).unwrap();
        assert_eq!(geometry.questions(), 1);
        assert_eq!(geometry.correct(), 0);

        assert_eq!(record.mistakes().len(), 2);
        assert_eq!(record.mistakes()[0].question_id, QuestionId::new("q2"));
        assert_eq!(record.mistakes()[1].user_answer, None);
        assert_eq!(record.time_spent_secs(), 120);
    }

    #[test]
    fn record_skips_answers_for_unknown_questions() {
        let questions = vec![question("q1", "algebra", 0)];
        let outcome = SessionOutcome {
            answers: vec![
                answer("q1", Some(0), true),
                answer("missing", Some(1), false),
            ],
            time_spent_secs: 30,
        };

        let record = SessionRecord::from_answers(&outcome, &questions, fixed_now());

        assert_eq!(record.breakdown().total_questions(), 1);
        assert!(record.mistakes().is_empty());
    }

    #[test]
    fn breakdown_invariant_holds_per_subject() {
        let questions = vec![
            question("q1", "algebra", 0),
            question("q2", "algebra", 0),
            question("q3", "geometry", 0),
        ];
        let outcome = SessionOutcome {
            answers: vec![
                answer("q1", Some(0), true),
                answer("q2", Some(1), false),
                answer("q3", Some(0), true),
            ],
            time_spent_secs: 60,
        };

        let record = SessionRecord::from_answers(&outcome, &questions, fixed_now());
        for (_, tally) in record.breakdown().iter() {
            assert!(tally.correct() <= tally.questions());
        }
    }

    #[test]
    fn persisted_breakdown_rejects_inverted_counts() {
        let err = SubjectBreakdown::from_persisted_parts([(subject("algebra"), 2, 3)]).unwrap_err();
        assert!(matches!(err, SessionRecordError::CountInvariant { .. }));
    }

    #[test]
    fn practice_sets_store_by_difficulty() {
        let sets = PracticeSets::only(Difficulty::Medium, vec![question("q1", "algebra", 0)]);
        assert_eq!(sets.get(Difficulty::Medium).len(), 1);
        assert!(sets.get(Difficulty::Easy).is_empty());
        assert!(sets.get(Difficulty::Hard).is_empty());
    }
}
