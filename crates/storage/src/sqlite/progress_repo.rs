use training_core::model::{ProgressCursor, UserId};

use super::SqliteRepository;
use super::mapping::map_progress_row;
use crate::repository::{ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(&self, user: &UserId) -> Result<Option<ProgressCursor>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT current_session, completed_sessions, status, last_activity
            FROM training_progress
            WHERE user_id = ?1
            ",
        )
        .bind(user.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.map(|row| map_progress_row(&row)).transpose()
    }

    async fn put_progress(
        &self,
        user: &UserId,
        cursor: &ProgressCursor,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO training_progress
                (user_id, current_session, completed_sessions, status, last_activity)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id) DO UPDATE SET
                current_session = excluded.current_session,
                completed_sessions = excluded.completed_sessions,
                status = excluded.status,
                last_activity = excluded.last_activity
            ",
        )
        .bind(user.as_str())
        .bind(i64::from(cursor.current_session()))
        .bind(i64::from(cursor.completed_sessions()))
        .bind(cursor.status().as_str())
        .bind(cursor.last_activity())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}
