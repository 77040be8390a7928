mod difficulty;
mod ids;
mod progress;
mod question;
mod session;
mod subject;

pub use difficulty::{Difficulty, DifficultyError};
pub use ids::{QuestionId, SessionNumber, SessionNumberError, UserId};
pub use progress::{ProgressCursor, ProgressError, TrainingStatus, unlocked_sessions};
pub use question::{Question, QuestionDraft, QuestionError};
pub use session::{
    AnswerRecord, Mistake, PracticeSets, SessionOutcome, SessionRecord, SessionRecordError,
    SubjectBreakdown, SubjectTally,
};
pub use subject::{ScoreSheet, SubjectError, SubjectName, SubjectScore};
