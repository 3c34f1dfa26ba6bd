//! Users repository
//!
//! Handles user accounts and each user's personal library (the `user_books`
//! junction table).

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sqlx::SqlitePool as Pool;

use super::sqlite_helpers::{new_id, now_iso8601};

// ============================================================================
// User Records
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
}

const USER_COLUMNS: &str = "id, email, password_hash, created_at, updated_at";

// ============================================================================
// Repository
// ============================================================================

pub struct UsersRepository {
    pool: Pool,
}

impl UsersRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    // ========================================================================
    // User CRUD
    // ========================================================================

    /// Create a new user. Fails with a unique violation if the email is taken.
    pub async fn create(&self, user: CreateUser) -> Result<UserRecord> {
        let id = new_id();
        let now = now_iso8601();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create user"))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Get user by email (emails are stored normalized)
    pub async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// List all users, oldest first
    pub async fn list(&self) -> Result<Vec<UserRecord>> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users ORDER BY created_at",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    // ========================================================================
    // Library (user <-> book)
    // ========================================================================

    /// Add a book to the user's library. Returns false if it was already there.
    pub async fn add_book(&self, user_id: &str, book_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_books (user_id, book_id, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id, book_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(now_iso8601())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a book from the user's library. Returns false if it was not there.
    pub async fn remove_book(&self, user_id: &str, book_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_books WHERE user_id = ? AND book_id = ?")
            .bind(user_id)
            .bind(book_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Check whether a book is in the user's library
    pub async fn has_book(&self, user_id: &str, book_id: &str) -> Result<bool> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM user_books WHERE user_id = ? AND book_id = ?")
                .bind(user_id)
                .bind(book_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.0 > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite_helpers::is_unique_violation;
    use crate::db::{CreateBook, Database};

    async fn setup() -> (Database, UserRecord) {
        let db = Database::connect_in_memory().await.unwrap();
        let user = db
            .users()
            .create(CreateUser {
                email: "reader@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        (db, user)
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let (db, user) = setup().await;

        let by_email = db.users().get_by_email("reader@example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(user.id.clone()));

        let by_id = db.users().get_by_id(&user.id).await.unwrap();
        assert_eq!(by_id.map(|u| u.email), Some("reader@example.com".to_string()));

        assert!(db.users().get_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let (db, _) = setup().await;

        let err = db
            .users()
            .create(CreateUser {
                email: "reader@example.com".to_string(),
                password_hash: "other".to_string(),
            })
            .await
            .unwrap_err();

        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_library_toggle_is_idempotent() {
        let (db, user) = setup().await;
        let book = db
            .books()
            .create(CreateBook {
                title: "Dune".to_string(),
                description: None,
                cover: None,
            })
            .await
            .unwrap();

        let users = db.users();
        assert!(users.add_book(&user.id, &book.id).await.unwrap());
        assert!(!users.add_book(&user.id, &book.id).await.unwrap());
        assert!(users.has_book(&user.id, &book.id).await.unwrap());

        assert!(users.remove_book(&user.id, &book.id).await.unwrap());
        assert!(!users.remove_book(&user.id, &book.id).await.unwrap());
        assert!(!users.has_book(&user.id, &book.id).await.unwrap());
    }
}
