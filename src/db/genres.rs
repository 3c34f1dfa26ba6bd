//! Genres repository

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool as Pool;

use super::sqlite_helpers::{insert_with_unique_slug, new_id, now_iso8601};
use crate::services::text_utils::search_key;

/// Genre record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GenreRecord {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const GENRE_COLUMNS: &str = "g.id, g.slug, g.name, g.created_at, g.updated_at";

pub struct GenreRepository {
    pool: Pool,
}

impl GenreRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a genre; the slug is derived from the name
    pub async fn create(&self, name: &str) -> Result<GenreRecord> {
        let id = new_id();
        let now = now_iso8601();
        let name_search = search_key(name);

        insert_with_unique_slug(&self.pool, "genres", name, |slug| {
            sqlx::query(
                "INSERT INTO genres (id, slug, name, name_search, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
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
            .ok_or_else(|| anyhow::anyhow!("Failed to create genre"))
    }

    /// Get a genre by exact name
    pub async fn get_by_name(&self, name: &str) -> Result<Option<GenreRecord>> {
        let record = sqlx::query_as::<_, GenreRecord>(&format!(
            "SELECT {} FROM genres g WHERE g.name = ? LIMIT 1",
            GENRE_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Return the genre with this name, creating it if needed
    pub async fn find_or_create(&self, name: &str) -> Result<GenreRecord> {
        match self.get_by_name(name).await? {
            Some(genre) => Ok(genre),
            None => self.create(name).await,
        }
    }

    /// Get a genre by ID or slug
    pub async fn get_by_id_or_slug(&self, id_or_slug: &str) -> Result<Option<GenreRecord>> {
        let record = sqlx::query_as::<_, GenreRecord>(&format!(
            "SELECT {} FROM genres g WHERE g.id = ?1 OR g.slug = ?1 LIMIT 1",
            GENRE_COLUMNS
        ))
        .bind(id_or_slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Case-insensitive substring search on the name; empty query matches all
    pub async fn search(&self, query: &str) -> Result<Vec<GenreRecord>> {
        let records = sqlx::query_as::<_, GenreRecord>(&format!(
            "SELECT {} FROM genres g WHERE instr(g.name_search, ?) > 0 ORDER BY g.name",
            GENRE_COLUMNS
        ))
        .bind(search_key(query))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Genres of a book
    pub async fn list_by_book(&self, book_id: &str) -> Result<Vec<GenreRecord>> {
        let records = sqlx::query_as::<_, GenreRecord>(&format!(
            r#"
            SELECT {} FROM genres g
            JOIN book_genres bg ON bg.genre_id = g.id
            WHERE bg.book_id = ?
            ORDER BY g.name
            "#,
            GENRE_COLUMNS
        ))
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}


#[cfg(test)]
mod tests {
    use crate::db::{CreateBook, Database};

    #[tokio::test]
    async fn test_genres_of_book() {
        let db = Database::connect_in_memory().await.unwrap();
        let book = db
            .books()
            .create(CreateBook {
                title: "Solaris".to_string(),
                description: None,
                cover: None,
            })
            .await
            .unwrap();

        let scifi = db.genres().find_or_create("Science Fiction").await.unwrap();
        let classic = db.genres().find_or_create("Classics").await.unwrap();
        db.books().add_genre(&book.id, &scifi.id).await.unwrap();
        db.books().add_genre(&book.id, &classic.id).await.unwrap();
        db.books().add_genre(&book.id, &classic.id).await.unwrap();

        let genres = db.genres().list_by_book(&book.id).await.unwrap();
        let names: Vec<_> = genres.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Classics", "Science Fiction"]);

        let by_slug = db.genres().get_by_id_or_slug("science-fiction").await.unwrap();
        assert_eq!(by_slug.map(|g| g.id), Some(scifi.id));
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_distinct_slugs() {
        let db = Database::connect_in_memory().await.unwrap();
        let genres = db.genres();

        let (first, second) = tokio::try_join!(
            genres.create("Science Fiction"),
            genres.create("Science fiction"),
        )
        .unwrap();

        let mut slugs = vec![first.slug, second.slug];
        slugs.sort();
        assert_eq!(slugs, vec!["science-fiction", "science-fiction-2"]);
    }
}
