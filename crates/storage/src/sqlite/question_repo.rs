use training_core::model::Difficulty;

use super::SqliteRepository;
use super::mapping::{map_question_row, options_to_json};
use crate::repository::{QuestionRecord, QuestionRepository, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn upsert_question(&self, record: &QuestionRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO questions (
                id, subject, question_text, question, question_legacy,
                correct_answer, incorrect_answers, explanation, difficulty
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                subject = excluded.subject,
                question_text = excluded.question_text,
                question = excluded.question,
                question_legacy = excluded.question_legacy,
                correct_answer = excluded.correct_answer,
                incorrect_answers = excluded.incorrect_answers,
                explanation = excluded.explanation,
                difficulty = excluded.difficulty
            ",
        )
        .bind(record.id.as_str())
        .bind(record.subject.as_str())
        .bind(record.question_text.as_deref())
        .bind(record.question.as_deref())
        .bind(record.question_text_legacy.as_deref())
        .bind(record.correct_answer.as_str())
        .bind(options_to_json(&record.incorrect_answers)?)
        .bind(record.explanation.as_deref())
        .bind(record.difficulty.level())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn list_by_difficulty(
        &self,
        difficulty: Difficulty,
    ) -> Result<Vec<QuestionRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT
                id, subject, question_text, question, question_legacy,
                correct_answer, incorrect_answers, explanation, difficulty
            FROM questions
            WHERE difficulty = ?1
            ORDER BY id ASC
            ",
        )
        .bind(difficulty.level())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_question_row(&row)?);
        }
        Ok(out)
    }
}
