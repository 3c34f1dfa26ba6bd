//! Books repository
//!
//! Covers are stored inline as BLOBs but never selected by the list queries;
//! records only carry a `has_cover` flag and the bytes are fetched on demand.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool as Pool;

use super::sqlite_helpers::{insert_with_unique_slug, limit_or_all, new_id, now_iso8601};
use crate::services::text_utils::search_key;

/// Book record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookRecord {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub has_cover: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookRecord {
    pub fn has_cover(&self) -> bool {
        self.has_cover != 0
    }
}

/// Input for creating a book
#[derive(Debug, Clone)]
pub struct CreateBook {
    pub title: String,
    pub description: Option<String>,
    pub cover: Option<Vec<u8>>,
}

const BOOK_COLUMNS: &str = "b.id, b.slug, b.title, b.description, (b.cover IS NOT NULL) AS has_cover, b.created_at, b.updated_at";

pub struct BookRepository {
    pool: Pool,
}

impl BookRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a book; the slug is derived from the title
    pub async fn create(&self, input: CreateBook) -> Result<BookRecord> {
        let id = new_id();
        let now = now_iso8601();
        let title_search = search_key(&input.title);

        insert_with_unique_slug(&self.pool, "books", &input.title, |slug| {
            sqlx::query(
                r#"
                INSERT INTO books (id, slug, title, title_search, description, cover, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(id.clone())
            .bind(slug)
            .bind(input.title.clone())
            .bind(title_search.clone())
            .bind(input.description.clone())
            .bind(input.cover.clone())
            .bind(now.clone())
            .bind(now.clone())
            .execute(&self.pool)
        })
        .await?;

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create book"))
    }

    /// Get a book by ID
    pub async fn get_by_id(&self, id: &str) -> Result<Option<BookRecord>> {
        let record = sqlx::query_as::<_, BookRecord>(&format!(
            "SELECT {} FROM books b WHERE b.id = ?",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Get a book by ID or slug
    pub async fn get_by_id_or_slug(&self, id_or_slug: &str) -> Result<Option<BookRecord>> {
        let record = sqlx::query_as::<_, BookRecord>(&format!(
            "SELECT {} FROM books b WHERE b.id = ?1 OR b.slug = ?1 LIMIT 1",
            BOOK_COLUMNS
        ))
        .bind(id_or_slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Case-insensitive substring search over titles, genre names and author names.
    /// An empty query matches every book.
    pub async fn search(&self, query: &str) -> Result<Vec<BookRecord>> {
        let records = sqlx::query_as::<_, BookRecord>(&format!(
            r#"
            SELECT {} FROM books b
            WHERE instr(b.title_search, ?1) > 0
               OR EXISTS (
                    SELECT 1 FROM book_genres bg
                    JOIN genres g ON g.id = bg.genre_id
                    WHERE bg.book_id = b.id AND instr(g.name_search, ?1) > 0
               )
               OR EXISTS (
                    SELECT 1 FROM book_authors ba
                    JOIN authors a ON a.id = ba.author_id
                    WHERE ba.book_id = b.id AND instr(a.name_search, ?1) > 0
               )
            ORDER BY b.title
            "#,
            BOOK_COLUMNS
        ))
        .bind(search_key(query))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Books ordered by how many libraries contain them
    pub async fn list_popular(&self, limit: i64) -> Result<Vec<BookRecord>> {
        let records = sqlx::query_as::<_, BookRecord>(&format!(
            r#"
            SELECT {} FROM books b
            LEFT JOIN user_books ub ON ub.book_id = b.id
            GROUP BY b.id
            ORDER BY COUNT(ub.user_id) DESC, b.title
            LIMIT ?
            "#,
            BOOK_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Books in a user's library, most recently added first
    pub async fn list_by_user(&self, user_id: &str, limit: Option<i64>) -> Result<Vec<BookRecord>> {
        let records = sqlx::query_as::<_, BookRecord>(&format!(
            r#"
            SELECT {} FROM books b
            JOIN user_books ub ON ub.book_id = b.id
            WHERE ub.user_id = ?
            ORDER BY ub.created_at DESC, b.title
            LIMIT ?
            "#,
            BOOK_COLUMNS
        ))
        .bind(user_id)
        .bind(limit_or_all(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Books written by an author
    pub async fn list_by_author(&self, author_id: &str) -> Result<Vec<BookRecord>> {
        let records = sqlx::query_as::<_, BookRecord>(&format!(
            r#"
            SELECT {} FROM books b
            JOIN book_authors ba ON ba.book_id = b.id
            WHERE ba.author_id = ?
            ORDER BY b.title
            "#,
            BOOK_COLUMNS
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Books tagged with a genre
    pub async fn list_by_genre(&self, genre_id: &str, limit: Option<i64>) -> Result<Vec<BookRecord>> {
        let records = sqlx::query_as::<_, BookRecord>(&format!(
            r#"
            SELECT {} FROM books b
            JOIN book_genres bg ON bg.book_id = b.id
            WHERE bg.genre_id = ?
            ORDER BY b.title
            LIMIT ?
            "#,
            BOOK_COLUMNS
        ))
        .bind(genre_id)
        .bind(limit_or_all(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Link an author to a book (no-op if already linked)
    pub async fn add_author(&self, book_id: &str, author_id: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO book_authors (book_id, author_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(book_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Link a genre to a book (no-op if already linked)
    pub async fn add_genre(&self, book_id: &str, genre_id: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO book_genres (book_id, genre_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(book_id)
        .bind(genre_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Number of users that have this book in their library
    pub async fn reader_count(&self, book_id: &str) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_books WHERE book_id = ?")
            .bind(book_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// Fetch the raw cover bytes for a book addressed by id or slug
    pub async fn get_cover(&self, id_or_slug: &str) -> Result<Option<Vec<u8>>> {
        let row: Option<(Option<Vec<u8>>,)> =
            sqlx::query_as("SELECT cover FROM books WHERE id = ?1 OR slug = ?1 LIMIT 1")
                .bind(id_or_slug)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.and_then(|(cover,)| cover))
    }

    /// Replace a book's cover
    pub async fn set_cover(&self, book_id: &str, cover: Option<&[u8]>) -> Result<bool> {
        let result = sqlx::query("UPDATE books SET cover = ?, updated_at = ? WHERE id = ?")
            .bind(cover)
            .bind(now_iso8601())
            .bind(book_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Ratings of every review for each of the given books
    pub async fn ratings_for(&self, book_ids: &[String]) -> Result<HashMap<String, Vec<i64>>> {
        let mut ratings: HashMap<String, Vec<i64>> = HashMap::new();
        if book_ids.is_empty() {
            return Ok(ratings);
        }

        let placeholders: Vec<String> = (1..=book_ids.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "SELECT book_id, rating FROM reviews WHERE book_id IN ({})",
            placeholders.join(", ")
        );

        let mut query = sqlx::query_as::<_, (String, i64)>(&sql);
        for id in book_ids {
            query = query.bind(id);
        }

        for (book_id, rating) in query.fetch_all(&self.pool).await? {
            ratings.entry(book_id).or_default().push(rating);
        }

        Ok(ratings)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::{CreateReview, CreateUser, Database};

    fn book(title: &str) -> CreateBook {
        CreateBook {
            title: title.to_string(),
            description: Some(format!("About {}", title)),
            cover: None,
        }
    }

    fn titles(records: &[BookRecord]) -> Vec<&str> {
        records.iter().map(|b| b.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_slug_is_derived_and_unique() {
        let db = Database::connect_in_memory().await.unwrap();

        let first = db.books().create(book("The Left Hand of Darkness")).await.unwrap();
        let second = db.books().create(book("The Left Hand of Darkness")).await.unwrap();

        assert_eq!(first.slug, "the-left-hand-of-darkness");
        assert_eq!(second.slug, "the-left-hand-of-darkness-2");

        let found = db.books().get_by_id_or_slug(&first.slug).await.unwrap();
        assert_eq!(found.map(|b| b.id), Some(first.id.clone()));
        let found = db.books().get_by_id_or_slug(&second.id).await.unwrap();
        assert_eq!(found.map(|b| b.id), Some(second.id));
    }

    #[tokio::test]
    async fn test_search_matches_title_author_and_genre() {
        let db = Database::connect_in_memory().await.unwrap();
        let books = db.books();

        let dune = books.create(book("Dune")).await.unwrap();
        let _emma = books.create(book("Emma")).await.unwrap();

        let herbert = db.authors().find_or_create("Frank Herbert").await.unwrap();
        let scifi = db.genres().find_or_create("Science Fiction").await.unwrap();
        books.add_author(&dune.id, &herbert.id).await.unwrap();
        books.add_genre(&dune.id, &scifi.id).await.unwrap();

        assert_eq!(titles(&books.search("DUN").await.unwrap()), vec!["Dune"]);
        assert_eq!(titles(&books.search("herb").await.unwrap()), vec!["Dune"]);
        assert_eq!(titles(&books.search("fiction").await.unwrap()), vec!["Dune"]);
        assert_eq!(titles(&books.search("").await.unwrap()), vec!["Dune", "Emma"]);
        assert!(books.search("zzz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_case() {
        let db = Database::connect_in_memory().await.unwrap();
        let books = db.books();

        let war = books.create(book("Válka s mloky")).await.unwrap();
        let capek = db.authors().find_or_create("Karel Čapek").await.unwrap();
        let satire = db.genres().find_or_create("Ŝatira").await.unwrap();
        books.add_author(&war.id, &capek.id).await.unwrap();
        books.add_genre(&war.id, &satire.id).await.unwrap();

        assert_eq!(titles(&books.search("VÁLKA").await.unwrap()), vec!["Válka s mloky"]);
        assert_eq!(titles(&books.search("čapek").await.unwrap()), vec!["Válka s mloky"]);
        assert_eq!(titles(&books.search("ŝat").await.unwrap()), vec!["Válka s mloky"]);
    }

    #[tokio::test]
    async fn test_popular_orders_by_reader_count() {
        let db = Database::connect_in_memory().await.unwrap();
        let books = db.books();

        let a = books.create(book("Alpha")).await.unwrap();
        let b = books.create(book("Beta")).await.unwrap();

        for email in ["one@example.com", "two@example.com"] {
            let user = db
                .users()
                .create(CreateUser {
                    email: email.to_string(),
                    password_hash: "x".to_string(),
                })
                .await
                .unwrap();
            db.users().add_book(&user.id, &b.id).await.unwrap();
        }

        let popular = books.list_popular(10).await.unwrap();
        assert_eq!(titles(&popular), vec!["Beta", "Alpha"]);
        assert_eq!(books.reader_count(&b.id).await.unwrap(), 2);
        assert_eq!(books.reader_count(&a.id).await.unwrap(), 0);

        assert_eq!(books.list_popular(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cover_roundtrip() {
        let db = Database::connect_in_memory().await.unwrap();
        let books = db.books();

        let created = books.create(book("Covered")).await.unwrap();
        assert!(!created.has_cover());
        assert_eq!(books.get_cover(&created.slug).await.unwrap(), None);

        let png = vec![0x89, b'P', b'N', b'G'];
        assert!(books.set_cover(&created.id, Some(&png)).await.unwrap());

        let reloaded = books.get_by_id(&created.id).await.unwrap().unwrap();
        assert!(reloaded.has_cover());
        assert_eq!(books.get_cover(&created.id).await.unwrap(), Some(png));
    }

    #[tokio::test]
    async fn test_ratings_for_groups_by_book() {
        let db = Database::connect_in_memory().await.unwrap();
        let books = db.books();
        let rated = books.create(book("Rated")).await.unwrap();
        let unrated = books.create(book("Unrated")).await.unwrap();

        for (email, rating) in [("a@example.com", 5), ("b@example.com", 3)] {
            let user = db
                .users()
                .create(CreateUser {
                    email: email.to_string(),
                    password_hash: "x".to_string(),
                })
                .await
                .unwrap();
            db.reviews()
                .create(CreateReview {
                    user_id: user.id,
                    book_id: rated.id.clone(),
                    rating,
                    text: "ok".to_string(),
                })
                .await
                .unwrap();
        }

        let ratings = books
            .ratings_for(&[rated.id.clone(), unrated.id.clone()])
            .await
            .unwrap();

        let mut got = ratings.get(&rated.id).cloned().unwrap_or_default();
        got.sort();
        assert_eq!(got, vec![3, 5]);
        assert!(!ratings.contains_key(&unrated.id));
    }
}
