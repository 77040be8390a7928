use thiserror::Error;

use crate::model::{Difficulty, QuestionId, SubjectName};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question has no prompt text in any known field")]
    MissingPrompt,

    #[error("correct answer text is blank")]
    BlankCorrectAnswer,

    #[error("question has no answer options")]
    NoOptions,

    #[error("correct option index {index} out of range for {len} options")]
    CorrectIndexOutOfRange { index: usize, len: usize },
}

/// Raw question document shape as the external store delivers it.
///
/// Question banks were populated over several iterations, so the prompt may
/// live in any of three fields; `prompt_text` resolves the first non-blank
/// one. The correct answer arrives separately from the distractors and is
/// merged into a single option list during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
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

fn non_blank(field: Option<&String>) -> Option<&str> {
    field.map(|s| s.trim()).filter(|s| !s.is_empty())
}

impl QuestionDraft {
    /// The resolved prompt: `question_text`, then `question`, then the
    /// legacy camel-case field.
    #[must_use]
    pub fn prompt_text(&self) -> Option<&str> {
        non_blank(self.question_text.as_ref())
            .or_else(|| non_blank(self.question.as_ref()))
            .or_else(|| non_blank(self.question_text_legacy.as_ref()))
    }

    /// Number of options the validated question will carry.
    #[must_use]
    pub fn option_count(&self) -> usize {
        self.incorrect_answers.len() + 1
    }

    /// Validate the draft into a [`Question`], inserting the correct answer
    /// at `correct_position` within the option list.
    ///
    /// The caller chooses the position (typically at random) so the correct
    /// answer does not always occupy the same slot.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::MissingPrompt` if no prompt field is usable,
    /// `QuestionError::BlankCorrectAnswer` if the correct answer is blank,
    /// or `QuestionError::CorrectIndexOutOfRange` if `correct_position`
    /// exceeds the option count.
    pub fn validate(self, correct_position: usize) -> Result<Question, QuestionError> {
        let prompt = self
            .prompt_text()
            .ok_or(QuestionError::MissingPrompt)?
            .to_string();

        if self.correct_answer.trim().is_empty() {
            return Err(QuestionError::BlankCorrectAnswer);
        }

        let len = self.option_count();
        if correct_position >= len {
            return Err(QuestionError::CorrectIndexOutOfRange {
                index: correct_position,
                len,
            });
        }

        let mut options = self.incorrect_answers;
        options.insert(correct_position, self.correct_answer);

        Question::from_persisted(
            self.id,
            self.subject,
            prompt,
            options,
            correct_position,
            self.explanation,
            self.difficulty,
        )
    }
}

/// A validated practice question. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    subject: SubjectName,
    prompt: String,
    options: Vec<String>,
    correct: usize,
    explanation: Option<String>,
    difficulty: Difficulty,
}

impl Question {
    /// Rehydrate a question from already-normalized parts.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::MissingPrompt` for a blank prompt,
    /// `QuestionError::NoOptions` for an empty option list, or
    /// `QuestionError::CorrectIndexOutOfRange` if `correct` does not index
    /// into `options`.
    pub fn from_persisted(
        id: QuestionId,
        subject: SubjectName,
        prompt: String,
        options: Vec<String>,
        correct: usize,
        explanation: Option<String>,
        difficulty: Difficulty,
    ) -> Result<Self, QuestionError> {
        if prompt.trim().is_empty() {
            return Err(QuestionError::MissingPrompt);
        }
        if options.is_empty() {
            return Err(QuestionError::NoOptions);
        }
        if correct >= options.len() {
            return Err(QuestionError::CorrectIndexOutOfRange {
                index: correct,
                len: options.len(),
            });
        }

        Ok(Self {
            id,
            subject,
            prompt,
            options,
            correct,
            explanation,
            difficulty,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn subject(&self) -> &SubjectName {
        &self.subject
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct(&self) -> usize {
        self.correct
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Whether the given option index is the correct answer.
    #[must_use]
    pub fn is_correct(&self, selected: usize) -> bool {
        selected == self.correct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(id: &str) -> QuestionDraft {
        QuestionDraft {
            id: QuestionId::new(id),
            subject: SubjectName::new("algebra").unwrap(),
            question_text: Some("2 + 2 = ?".into()),
            question: None,
            question_text_legacy: None,
            correct_answer: "4".into(),
            incorrect_answers: vec!["3".into(), "5".into(), "22".into()],
            explanation: None,
            difficulty: Difficulty::Easy,
        }
    }

    #[test]
    fn validate_places_correct_answer_at_position() {
        let question = draft("q1").validate(2).unwrap();
        assert_eq!(question.options(), &["3", "5", "4", "22"]);
        assert_eq!(question.correct(), 2);
        assert!(question.is_correct(2));
        assert!(!question.is_correct(0));
    }

    #[test]
    fn prompt_falls_back_across_fields() {
        let mut d = draft("q1");
        d.question_text = Some("  ".into());
        d.question = None;
        d.question_text_legacy = Some("legacy text".into());
        assert_eq!(d.prompt_text(), Some("legacy text"));

        let question = d.validate(0).unwrap();
        assert_eq!(question.prompt(), "legacy text");
    }

    #[test]
    fn missing_prompt_is_rejected() {
        let mut d = draft("q1");
        d.question_text = None;
        assert!(matches!(d.validate(0), Err(QuestionError::MissingPrompt)));
    }

    #[test]
    fn blank_correct_answer_is_rejected() {
        let mut d = draft("q1");
        d.correct_answer = " ".into();
        assert!(matches!(
            d.validate(0),
            Err(QuestionError::BlankCorrectAnswer)
        ));
    }

    #[test]
    fn out_of_range_position_is_rejected() {
        let d = draft("q1");
        let len = d.option_count();
        assert!(matches!(
            d.validate(len),
            Err(QuestionError::CorrectIndexOutOfRange { .. })
        ));
    }

    #[test]
    fn from_persisted_checks_correct_index() {
        let err = Question::from_persisted(
            QuestionId::new("q1"),
            SubjectName::new("algebra").unwrap(),
            "prompt".into(),
            vec!["a".into(), "b".into()],
            2,
            None,
            Difficulty::Easy,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            QuestionError::CorrectIndexOutOfRange { index: 2, len: 2 }
        ));
    }
}
