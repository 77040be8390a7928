use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs a single, consolidated migration for the current schema.
///
/// Creates the full schema: question bank, diagnostic scores, session
/// results with their breakdown and mistake rows, the progress cursor, and
/// indexes.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: full schema.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS questions (
                    id TEXT PRIMARY KEY,
                    subject TEXT NOT NULL,
                    question_text TEXT,
                    question TEXT,
                    question_legacy TEXT,
                    correct_answer TEXT NOT NULL,
                    incorrect_answers TEXT NOT NULL,
                    explanation TEXT,
                    difficulty INTEGER NOT NULL CHECK (difficulty BETWEEN 1 AND 3)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS diagnostic_scores (
                    user_id TEXT NOT NULL,
                    subject TEXT NOT NULL,
                    grade REAL NOT NULL CHECK (grade >= 0),
                    PRIMARY KEY (user_id, subject)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS session_results (
                    user_id TEXT NOT NULL,
                    session_number INTEGER NOT NULL CHECK (session_number BETWEEN 1 AND 9),
                    time_spent_secs INTEGER NOT NULL CHECK (time_spent_secs >= 0),
                    completed_at TEXT NOT NULL,
                    PRIMARY KEY (user_id, session_number)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS session_subject_breakdown (
                    user_id TEXT NOT NULL,
                    session_number INTEGER NOT NULL,
                    subject TEXT NOT NULL,
                    questions INTEGER NOT NULL CHECK (questions >= 0),
                    correct INTEGER NOT NULL CHECK (correct >= 0 AND correct <= questions),
                    PRIMARY KEY (user_id, session_number, subject),
                    FOREIGN KEY (user_id, session_number)
                        REFERENCES session_results(user_id, session_number) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS session_mistakes (
                    id INTEGER PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    session_number INTEGER NOT NULL,
                    question_id TEXT NOT NULL,
                    user_answer INTEGER,
                    FOREIGN KEY (user_id, session_number)
                        REFERENCES session_results(user_id, session_number) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS training_progress (
                    user_id TEXT PRIMARY KEY,
                    current_session INTEGER NOT NULL CHECK (current_session >= 1),
                    completed_sessions INTEGER NOT NULL CHECK (completed_sessions >= 0),
                    status TEXT NOT NULL,
                    last_activity TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_questions_difficulty_id
                    ON questions(difficulty, id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_session_results_user_completed
                    ON session_results(user_id, completed_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_session_mistakes_user_session
                    ON session_mistakes(user_id, session_number);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
