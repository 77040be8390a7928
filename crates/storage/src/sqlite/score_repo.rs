use training_core::model::{ScoreSheet, SubjectName, UserId};

use super::SqliteRepository;
use super::mapping::{ser, subject_from_str};
use crate::repository::{ScoreRepository, StorageError};

use sqlx::Row;

#[async_trait::async_trait]
impl ScoreRepository for SqliteRepository {
    async fn upsert_score(
        &self,
        user: &UserId,
        subject: &SubjectName,
        grade: f64,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO diagnostic_scores (user_id, subject, grade)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id, subject) DO UPDATE SET
                grade = excluded.grade
            ",
        )
        .bind(user.as_str())
        .bind(subject.as_str())
        .bind(grade)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_scores(&self, user: &UserId) -> Result<ScoreSheet, StorageError> {
        // Subject order matches the original score source, whose documents
        // come back ordered by id (the subject name).
        let rows = sqlx::query(
            r"
            SELECT subject, grade
            FROM diagnostic_scores
            WHERE user_id = ?1
            ORDER BY subject ASC
            ",
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut sheet = ScoreSheet::new();
        for row in rows {
            let subject = subject_from_str(&row.try_get::<String, _>("subject").map_err(ser)?)?;
            let grade: f64 = row.try_get("grade").map_err(ser)?;
            sheet.push(subject, grade);
        }
        Ok(sheet)
    }
}
