use std::collections::BTreeMap;

use hygiene_core::model::{UserId, UserStats};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{ser, u32_from_i64};
use crate::repository::{StorageError, UserStatsRepository};

#[async_trait::async_trait]
impl UserStatsRepository for SqliteRepository {
    async fn get_stats(&self, user_id: &UserId) -> Result<Option<UserStats>, StorageError> {
        let Some(row) = sqlx::query(
            r"
            SELECT user_name, total_sessions, total_questions, total_correct,
                   last_session_at, current_streak, longest_streak
            FROM user_stats
            WHERE user_id = ?1
            ",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        else {
            return Ok(None);
        };

        let category_rows = sqlx::query(
            r"
            SELECT category, correct, attempts
            FROM user_category_stats
            WHERE user_id = ?1
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut category_correct = BTreeMap::new();
        let mut category_attempts = BTreeMap::new();
        for r in &category_rows {
            let category: String = r.try_get("category").map_err(ser)?;
            let correct = u32_from_i64("correct", r.try_get::<i64, _>("correct").map_err(ser)?)?;
            let attempts =
                u32_from_i64("attempts", r.try_get::<i64, _>("attempts").map_err(ser)?)?;
            category_correct.insert(category.clone(), correct);
            category_attempts.insert(category, attempts);
        }

        UserStats::from_persisted(
            user_id.clone(),
            row.try_get("user_name").map_err(ser)?,
            u32_from_i64(
                "total_sessions",
                row.try_get::<i64, _>("total_sessions").map_err(ser)?,
            )?,
            u32_from_i64(
                "total_questions",
                row.try_get::<i64, _>("total_questions").map_err(ser)?,
            )?,
            u32_from_i64(
                "total_correct",
                row.try_get::<i64, _>("total_correct").map_err(ser)?,
            )?,
            category_correct,
            category_attempts,
            row.try_get("last_session_at").map_err(ser)?,
            u32_from_i64(
                "current_streak",
                row.try_get::<i64, _>("current_streak").map_err(ser)?,
            )?,
            u32_from_i64(
                "longest_streak",
                row.try_get::<i64, _>("longest_streak").map_err(ser)?,
            )?,
        )
        .map(Some)
        .map_err(ser)
    }

    async fn upsert_stats(&self, stats: &UserStats) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO user_stats (
                user_id, user_name, total_sessions, total_questions, total_correct,
                last_session_at, current_streak, longest_streak
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(user_id) DO UPDATE SET
                user_name = excluded.user_name,
                total_sessions = excluded.total_sessions,
                total_questions = excluded.total_questions,
                total_correct = excluded.total_correct,
                last_session_at = excluded.last_session_at,
                current_streak = excluded.current_streak,
                longest_streak = excluded.longest_streak
            ",
        )
        .bind(stats.user_id().as_str())
        .bind(stats.user_name())
        .bind(i64::from(stats.total_sessions()))
        .bind(i64::from(stats.total_questions()))
        .bind(i64::from(stats.total_correct()))
        .bind(stats.last_session_at())
        .bind(i64::from(stats.current_streak()))
        .bind(i64::from(stats.longest_streak()))
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query("DELETE FROM user_category_stats WHERE user_id = ?1")
            .bind(stats.user_id().as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        for (category, attempts) in stats.category_attempts_map() {
            sqlx::query(
                r"
                INSERT INTO user_category_stats (user_id, category, correct, attempts)
                VALUES (?1, ?2, ?3, ?4)
                ",
            )
            .bind(stats.user_id().as_str())
            .bind(category.as_str())
            .bind(i64::from(stats.category_correct(category)))
            .bind(i64::from(*attempts))
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}
