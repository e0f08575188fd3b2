use hygiene_core::model::Category;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{map_question_row, options_to_json, ser, usize_to_i64};
use crate::repository::{QuestionRepository, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn upsert_category(&self, category: &Category) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO categories (name, description, position)
            VALUES (?1, ?2, (SELECT COALESCE(MAX(position) + 1, 0) FROM categories))
            ON CONFLICT(name) DO UPDATE SET
                description = excluded.description
            ",
        )
        .bind(category.name())
        .bind(category.description())
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query("DELETE FROM questions WHERE category_name = ?1")
            .bind(category.name())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        for (position, question) in category.questions().iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO questions (
                    category_name, id, position, question, options,
                    correct_index, explanation, category, difficulty
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ",
            )
            .bind(category.name())
            .bind(question.id().as_str())
            .bind(usize_to_i64("position", position)?)
            .bind(question.text())
            .bind(options_to_json(question.options())?)
            .bind(usize_to_i64("correct_index", question.correct_index())?)
            .bind(question.explanation())
            .bind(question.category())
            .bind(question.difficulty())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn list_category_names(&self) -> Result<Vec<String>, StorageError> {
        let rows = sqlx::query("SELECT name FROM categories ORDER BY position ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut names = Vec::with_capacity(rows.len());
        for row in rows {
            names.push(row.try_get::<String, _>("name").map_err(ser)?);
        }
        Ok(names)
    }

    async fn get_category(&self, name: &str) -> Result<Option<Category>, StorageError> {
        let Some(row) = sqlx::query("SELECT name, description FROM categories WHERE name = ?1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?
        else {
            return Ok(None);
        };

        let rows = sqlx::query(
            r"
            SELECT id, question, options, correct_index, explanation, category, difficulty
            FROM questions
            WHERE category_name = ?1
            ORDER BY position ASC
            ",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut questions = Vec::with_capacity(rows.len());
        for row in &rows {
            questions.push(map_question_row(row)?);
        }

        Category::new(
            row.try_get::<String, _>("name").map_err(ser)?,
            row.try_get::<String, _>("description").map_err(ser)?,
            questions,
        )
        .map(Some)
        .map_err(ser)
    }
}
