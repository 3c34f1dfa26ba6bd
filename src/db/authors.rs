//! Authors repository

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool as Pool;

use super::sqlite_helpers::{insert_with_unique_slug, new_id, now_iso8601};
use crate::services::text_utils::search_key;

/// Author record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthorRecord {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const AUTHOR_COLUMNS: &str = "a.id, a.slug, a.name, a.created_at, a.updated_at";

pub struct AuthorRepository {
    pool: Pool,
}

impl AuthorRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create an author; the slug is derived from the name
    pub async fn create(&self, name: &str) -> Result<AuthorRecord> {
        let id = new_id();
        let now = now_iso8601();
        let name_search = search_key(name);

        insert_with_unique_slug(&self.pool, "authors", name, |slug| {
            sqlx::query(
                "INSERT INTO authors (id, slug, name, name_search, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(id.clone())
            .bind(slug)
            .bind(name.to_string())
            .bind(name_search.clone())
            .bind(now.clone())
            .bind(now.clone())
            .execute(&self.pool)
        })
        .await?;

        self.get_by_id_or_slug(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create author"))
    }

    /// Get an author by exact name
    pub async fn get_by_name(&self, name: &str) -> Result<Option<AuthorRecord>> {
        let record = sqlx::query_as::<_, AuthorRecord>(&format!(
            "SELECT {} FROM authors a WHERE a.name = ? LIMIT 1",
            AUTHOR_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Return the author with this name, creating it if needed
    pub async fn find_or_create(&self, name: &str) -> Result<AuthorRecord> {
        match self.get_by_name(name).await? {
            Some(author) => Ok(author),
            None => self.create(name).await,
        }
    }

    /// Get an author by ID or slug
    pub async fn get_by_id_or_slug(&self, id_or_slug: &str) -> Result<Option<AuthorRecord>> {
        let record = sqlx::query_as::<_, AuthorRecord>(&format!(
            "SELECT {} FROM authors a WHERE a.id = ?1 OR a.slug = ?1 LIMIT 1",
            AUTHOR_COLUMNS
        ))
        .bind(id_or_slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Case-insensitive substring search on the name; empty query matches all
    pub async fn search(&self, query: &str) -> Result<Vec<AuthorRecord>> {
        let records = sqlx::query_as::<_, AuthorRecord>(&format!(
            "SELECT {} FROM authors a WHERE instr(a.name_search, ?) > 0 ORDER BY a.name",
            AUTHOR_COLUMNS
        ))
        .bind(search_key(query))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Authors of a book
    pub async fn list_by_book(&self, book_id: &str) -> Result<Vec<AuthorRecord>> {
        let records = sqlx::query_as::<_, AuthorRecord>(&format!(
            r#"
            SELECT {} FROM authors a
            JOIN book_authors ba ON ba.author_id = a.id
            WHERE ba.book_id = ?
            ORDER BY a.name
            "#,
            AUTHOR_COLUMNS
        ))
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
