use sqlx::Row;

use training_core::model::{
    Mistake, QuestionId, SessionNumber, SessionRecord, SubjectBreakdown, UserId,
};

use super::SqliteRepository;
use super::mapping::{ser, session_number_from_i64, subject_from_str, u32_from_i64};
use crate::repository::{SessionResultRepository, SessionResultRow, StorageError};

async fn load_breakdown(
    pool: &sqlx::SqlitePool,
    user: &UserId,
    session: SessionNumber,
) -> Result<SubjectBreakdown, StorageError> {
    let rows = sqlx::query(
        r"
        SELECT subject, questions, correct
        FROM session_subject_breakdown
        WHERE user_id = ?1 AND session_number = ?2
        ORDER BY subject ASC
        ",
    )
    .bind(user.as_str())
    .bind(i64::from(session.value()))
    .fetch_all(pool)
    .await
    .map_err(|e| StorageError::Connection(e.to_string()))?;

    let mut parts = Vec::with_capacity(rows.len());
    for row in rows {
        let subject = subject_from_str(&row.try_get::<String, _>("subject").map_err(ser)?)?;
        let questions = u32_from_i64("questions", row.try_get::<i64, _>("questions").map_err(ser)?)?;
        let correct = u32_from_i64("correct", row.try_get::<i64, _>("correct").map_err(ser)?)?;
        parts.push((subject, questions, correct));
    }
    SubjectBreakdown::from_persisted_parts(parts).map_err(ser)
}

async fn load_mistakes(
    pool: &sqlx::SqlitePool,
    user: &UserId,
    session: SessionNumber,
) -> Result<Vec<Mistake>, StorageError> {
    let rows = sqlx::query(
        r"
        SELECT question_id, user_answer
        FROM session_mistakes
        WHERE user_id = ?1 AND session_number = ?2
        ORDER BY id ASC
        ",
    )
    .bind(user.as_str())
    .bind(i64::from(session.value()))
    .fetch_all(pool)
    .await
    .map_err(|e| StorageError::Connection(e.to_string()))?;

    let mut mistakes = Vec::with_capacity(rows.len());
    for row in rows {
        let question_id: String = row.try_get("question_id").map_err(ser)?;
        let user_answer: Option<i64> = row.try_get("user_answer").map_err(ser)?;
        let user_answer = user_answer
            .map(|v| {
                usize::try_from(v)
                    .map_err(|_| StorageError::Serialization(format!("invalid user_answer: {v}")))
            })
            .transpose()?;
        mistakes.push(Mistake {
            question_id: QuestionId::new(question_id),
            user_answer,
        });
    }
    Ok(mistakes)
}

#[async_trait::async_trait]
impl SessionResultRepository for SqliteRepository {
    async fn put_result(
        &self,
        user: &UserId,
        session: SessionNumber,
        record: &SessionRecord,
    ) -> Result<(), StorageError> {
        // Overwrite semantics: a resubmitted session fully replaces the
        // previous result document, including its child rows.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
            DELETE FROM session_results
            WHERE user_id = ?1 AND session_number = ?2
            ",
        )
        .bind(user.as_str())
        .bind(i64::from(session.value()))
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO session_results (user_id, session_number, time_spent_secs, completed_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(user.as_str())
        .bind(i64::from(session.value()))
        .bind(i64::from(record.time_spent_secs()))
        .bind(record.completed_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        for (subject, tally) in record.breakdown().iter() {
            sqlx::query(
                r"
                INSERT INTO session_subject_breakdown
                    (user_id, session_number, subject, questions, correct)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )
            .bind(user.as_str())
            .bind(i64::from(session.value()))
            .bind(subject.as_str())
            .bind(i64::from(tally.questions()))
            .bind(i64::from(tally.correct()))
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        for mistake in record.mistakes() {
            let user_answer = mistake
                .user_answer
                .map(|v| {
                    i64::try_from(v)
                        .map_err(|_| StorageError::Serialization("user_answer overflow".into()))
                })
                .transpose()?;
            sqlx::query(
                r"
                INSERT INTO session_mistakes (user_id, session_number, question_id, user_answer)
                VALUES (?1, ?2, ?3, ?4)
                ",
            )
            .bind(user.as_str())
            .bind(i64::from(session.value()))
            .bind(mistake.question_id.as_str())
            .bind(user_answer)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_result(
        &self,
        user: &UserId,
        session: SessionNumber,
    ) -> Result<Option<SessionRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT time_spent_secs, completed_at
            FROM session_results
            WHERE user_id = ?1 AND session_number = ?2
            ",
        )
        .bind(user.as_str())
        .bind(i64::from(session.value()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let time_spent_secs = u32_from_i64(
            "time_spent_secs",
            row.try_get::<i64, _>("time_spent_secs").map_err(ser)?,
        )?;
        let completed_at = row.try_get("completed_at").map_err(ser)?;
        let breakdown = load_breakdown(&self.pool, user, session).await?;
        let mistakes = load_mistakes(&self.pool, user, session).await?;

        Ok(Some(SessionRecord::from_persisted(
            time_spent_secs,
            breakdown,
            mistakes,
            completed_at,
        )))
    }

    async fn list_results(&self, user: &UserId) -> Result<Vec<SessionResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT session_number
            FROM session_results
            WHERE user_id = ?1
            ORDER BY completed_at DESC, session_number DESC
            ",
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let session =
                session_number_from_i64(row.try_get::<i64, _>("session_number").map_err(ser)?)?;
            let record = self
                .get_result(user, session)
                .await?
                .ok_or(StorageError::NotFound)?;
            out.push(SessionResultRow::new(session, record));
        }
        Ok(out)
    }
}
