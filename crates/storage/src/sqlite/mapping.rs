use sqlx::Row;

use training_core::model::{
    Difficulty, ProgressCursor, QuestionId, SessionNumber, SubjectName, TrainingStatus,
};

use crate::repository::{QuestionRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn session_number_from_i64(v: i64) -> Result<SessionNumber, StorageError> {
    let raw = u8::try_from(v)
        .map_err(|_| StorageError::Serialization(format!("invalid session_number: {v}")))?;
    SessionNumber::new(raw).map_err(ser)
}

pub(crate) fn subject_from_str(raw: &str) -> Result<SubjectName, StorageError> {
    SubjectName::new(raw).map_err(ser)
}

/// Options are persisted as a JSON string array, matching the array shape of
/// the original question documents.
pub(crate) fn options_to_json(options: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(options).map_err(ser)
}

pub(crate) fn options_from_json(raw: &str) -> Result<Vec<String>, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn map_question_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<QuestionRecord, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let subject = subject_from_str(&row.try_get::<String, _>("subject").map_err(ser)?)?;
    let difficulty =
        Difficulty::from_level(row.try_get::<i64, _>("difficulty").map_err(ser)?).map_err(ser)?;
    let incorrect_answers =
        options_from_json(&row.try_get::<String, _>("incorrect_answers").map_err(ser)?)?;

    Ok(QuestionRecord {
        id: QuestionId::new(id),
        subject,
        question_text: row.try_get("question_text").map_err(ser)?,
        question: row.try_get("question").map_err(ser)?,
        question_text_legacy: row.try_get("question_legacy").map_err(ser)?,
        correct_answer: row.try_get("correct_answer").map_err(ser)?,
        incorrect_answers,
        explanation: row.try_get("explanation").map_err(ser)?,
        difficulty,
    })
}

pub(crate) fn map_progress_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ProgressCursor, StorageError> {
    let current = row.try_get::<i64, _>("current_session").map_err(ser)?;
    let current = u8::try_from(current)
        .map_err(|_| StorageError::Serialization(format!("invalid current_session: {current}")))?;
    let completed = row.try_get::<i64, _>("completed_sessions").map_err(ser)?;
    let completed = u8::try_from(completed).map_err(|_| {
        StorageError::Serialization(format!("invalid completed_sessions: {completed}"))
    })?;
    let status: TrainingStatus = row
        .try_get::<String, _>("status")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let last_activity = row.try_get("last_activity").map_err(ser)?;

    ProgressCursor::from_persisted(current, completed, status, last_activity).map_err(ser)
}
