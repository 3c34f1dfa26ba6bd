//! Reviews repository
//!
//! A review is addressed by its (user, book) pair; the table enforces that
//! pair to be unique and the rating to stay within 1..=5.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool as Pool;

use super::sqlite_helpers::{new_id, now_iso8601};

/// Review record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReviewRecord {
    pub id: String,
    pub user_id: String,
    pub book_id: String,
    pub rating: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a review
#[derive(Debug, Clone)]
pub struct CreateReview {
    pub user_id: String,
    pub book_id: String,
    pub rating: i64,
    pub text: String,
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct UpdateReview {
    pub rating: Option<i64>,
    pub text: Option<String>,
}

const REVIEW_COLUMNS: &str = "id, user_id, book_id, rating, text, created_at, updated_at";

pub struct ReviewRepository {
    pool: Pool,
}

impl ReviewRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a review
    pub async fn create(&self, input: CreateReview) -> Result<ReviewRecord> {
        let id = new_id();
        let now = now_iso8601();

        sqlx::query(
            r#"
            INSERT INTO reviews (id, user_id, book_id, rating, text, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.user_id)
        .bind(&input.book_id)
        .bind(input.rating)
        .bind(&input.text)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create review"))
    }

    /// Get a review by ID
    pub async fn get_by_id(&self, id: &str) -> Result<Option<ReviewRecord>> {
        let record = sqlx::query_as::<_, ReviewRecord>(&format!(
            "SELECT {} FROM reviews WHERE id = ?",
            REVIEW_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Get the review a user wrote for a book
    pub async fn get_by_user_and_book(
        &self,
        user_id: &str,
        book_id: &str,
    ) -> Result<Option<ReviewRecord>> {
        let record = sqlx::query_as::<_, ReviewRecord>(&format!(
            "SELECT {} FROM reviews WHERE user_id = ? AND book_id = ?",
            REVIEW_COLUMNS
        ))
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Update the review a user wrote for a book. Returns None if there is none.
    pub async fn update_by_user_and_book(
        &self,
        user_id: &str,
        book_id: &str,
        input: UpdateReview,
    ) -> Result<Option<ReviewRecord>> {
        let result = sqlx::query(
            r#"
            UPDATE reviews
            SET rating = COALESCE(?, rating),
                text = COALESCE(?, text),
                updated_at = ?
            WHERE user_id = ? AND book_id = ?
            "#,
        )
        .bind(input.rating)
        .bind(&input.text)
        .bind(now_iso8601())
        .bind(user_id)
        .bind(book_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_user_and_book(user_id, book_id).await
    }

    /// Delete the review a user wrote for a book, returning what was deleted
    pub async fn delete_by_user_and_book(
        &self,
        user_id: &str,
        book_id: &str,
    ) -> Result<Option<ReviewRecord>> {
        let Some(existing) = self.get_by_user_and_book(user_id, book_id).await? else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(&existing.id)
            .execute(&self.pool)
            .await?;

        Ok(Some(existing))
    }

    /// Reviews of a book, newest first
    pub async fn list_by_book(&self, book_id: &str) -> Result<Vec<ReviewRecord>> {
        let records = sqlx::query_as::<_, ReviewRecord>(&format!(
            "SELECT {} FROM reviews WHERE book_id = ? ORDER BY created_at DESC",
            REVIEW_COLUMNS
        ))
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Reviews written by a user, newest first
    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<ReviewRecord>> {
        let records = sqlx::query_as::<_, ReviewRecord>(&format!(
            "SELECT {} FROM reviews WHERE user_id = ? ORDER BY created_at DESC",
            REVIEW_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
