use thiserror::Error;

use crate::model::{ProgressError, QuestionError, SessionRecordError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    SessionRecord(#[from] SessionRecordError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}
