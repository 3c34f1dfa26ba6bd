//! GraphQL type definitions
//!
//! These types mirror the database records but are decorated with async-graphql
//! attributes. Relations and computed fields resolve lazily through `ComplexObject`.

use async_graphql::dataloader::DataLoader;
use async_graphql::{ComplexObject, Context, InputObject, Result, SimpleObject};
use chrono::{DateTime, Utc};

use crate::db::{AuthorRecord, BookRecord, Database, GenreRecord, ReviewRecord, UserRecord};
use crate::graphql::auth::AuthExt;
use crate::graphql::error::{ApiError, ApiResultExt};
use crate::graphql::loaders::RatingLoader;
use crate::services::book_rating;

// ============================================================================
// Book
// ============================================================================

#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex)]
pub struct Book {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[graphql(skip)]
    pub has_cover: bool,
}

impl From<BookRecord> for Book {
    fn from(r: BookRecord) -> Self {
        Self {
            has_cover: r.has_cover(),
            id: r.id,
            slug: r.slug,
            title: r.title,
            description: r.description,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl Book {
    async fn ratings(&self, ctx: &Context<'_>) -> Result<Vec<i64>> {
        let loader = ctx.data_unchecked::<DataLoader<RatingLoader>>();
        let ratings = loader
            .load_one(self.id.clone())
            .await
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to load ratings: {}", e)))
            .gql()?;

        Ok(ratings.unwrap_or_default())
    }
}

#[ComplexObject]
impl Book {
    /// URL of the cover image, if the book has one
    async fn cover(&self) -> Option<String> {
        self.has_cover
            .then(|| format!("/api/books/{}/cover", self.slug))
    }

    async fn authors(&self, ctx: &Context<'_>) -> Result<Vec<Author>> {
        let db = ctx.data_unchecked::<Database>();
        let records = db.authors().list_by_book(&self.id).await.gql()?;
        Ok(records.into_iter().map(Author::from).collect())
    }

    async fn genres(&self, ctx: &Context<'_>) -> Result<Vec<Genre>> {
        let db = ctx.data_unchecked::<Database>();
        let records = db.genres().list_by_book(&self.id).await.gql()?;
        Ok(records.into_iter().map(Genre::from).collect())
    }

    /// Reviews, newest first
    async fn reviews(&self, ctx: &Context<'_>) -> Result<Vec<Review>> {
        let db = ctx.data_unchecked::<Database>();
        let records = db.reviews().list_by_book(&self.id).await.gql()?;
        Ok(records.into_iter().map(Review::from).collect())
    }

    /// Mean rating floored to one decimal; 0 without reviews
    async fn rating(&self, ctx: &Context<'_>) -> Result<f64> {
        Ok(book_rating(&self.ratings(ctx).await?))
    }

    async fn review_count(&self, ctx: &Context<'_>) -> Result<i32> {
        Ok(self.ratings(ctx).await?.len() as i32)
    }

    /// Number of users with this book in their library
    async fn reader_count(&self, ctx: &Context<'_>) -> Result<i32> {
        let db = ctx.data_unchecked::<Database>();
        let count = db.books().reader_count(&self.id).await.gql()?;
        Ok(count as i32)
    }

    /// Whether the book is in the caller's library; false without a session
    async fn in_library(&self, ctx: &Context<'_>) -> Result<bool> {
        let Some(session) = ctx.try_session_user() else {
            return Ok(false);
        };
        let db = ctx.data_unchecked::<Database>();
        db.users().has_book(&session.user_id, &self.id).await.gql()
    }
}

// ============================================================================
// Author / Genre
// ============================================================================

#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex)]
pub struct Author {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AuthorRecord> for Author {
    fn from(r: AuthorRecord) -> Self {
        Self {
            id: r.id,
            slug: r.slug,
            name: r.name,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[ComplexObject]
impl Author {
    async fn books(&self, ctx: &Context<'_>) -> Result<Vec<Book>> {
        let db = ctx.data_unchecked::<Database>();
        let records = db.books().list_by_author(&self.id).await.gql()?;
        Ok(records.into_iter().map(Book::from).collect())
    }
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex)]
pub struct Genre {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GenreRecord> for Genre {
    fn from(r: GenreRecord) -> Self {
        Self {
            id: r.id,
            slug: r.slug,
            name: r.name,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[ComplexObject]
impl Genre {
    async fn books(&self, ctx: &Context<'_>, limit: Option<i32>) -> Result<Vec<Book>> {
        let db = ctx.data_unchecked::<Database>();
        let records = db
            .books()
            .list_by_genre(&self.id, limit.map(i64::from))
            .await
            .gql()?;
        Ok(records.into_iter().map(Book::from).collect())
    }
}

// ============================================================================
// User
// ============================================================================

/// A user profile. The password hash has no GraphQL field.
#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex)]
pub struct User {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(r: UserRecord) -> Self {
        Self {
            id: r.id,
            email: r.email,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[ComplexObject]
impl User {
    /// Books in this user's library, most recently added first
    async fn books(&self, ctx: &Context<'_>, limit: Option<i32>) -> Result<Vec<Book>> {
        let db = ctx.data_unchecked::<Database>();
        let records = db
            .books()
            .list_by_user(&self.id, limit.map(i64::from))
            .await
            .gql()?;
        Ok(records.into_iter().map(Book::from).collect())
    }

    async fn reviews(&self, ctx: &Context<'_>) -> Result<Vec<Review>> {
        let db = ctx.data_unchecked::<Database>();
        let records = db.reviews().list_by_user(&self.id).await.gql()?;
        Ok(records.into_iter().map(Review::from).collect())
    }
}

// ============================================================================
// Review
// ============================================================================

#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex)]
pub struct Review {
    pub id: String,
    pub rating: i32,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[graphql(skip)]
    pub user_id: String,
    #[graphql(skip)]
    pub book_id: String,
}

impl From<ReviewRecord> for Review {
    fn from(r: ReviewRecord) -> Self {
        Self {
            id: r.id,
            rating: r.rating as i32,
            text: r.text,
            created_at: r.created_at,
            updated_at: r.updated_at,
            user_id: r.user_id,
            book_id: r.book_id,
        }
    }
}

#[ComplexObject]
impl Review {
    async fn user(&self, ctx: &Context<'_>) -> Result<User> {
        let db = ctx.data_unchecked::<Database>();
        db.users()
            .get_by_id(&self.user_id)
            .await
            .map_err(ApiError::from)
            .and_then(|u| u.ok_or(ApiError::NotFound("user")))
            .map(User::from)
            .gql()
    }

    async fn book(&self, ctx: &Context<'_>) -> Result<Book> {
        let db = ctx.data_unchecked::<Database>();
        db.books()
            .get_by_id(&self.book_id)
            .await
            .map_err(ApiError::from)
            .and_then(|b| b.ok_or(ApiError::NotFound("book")))
            .map(Book::from)
            .gql()
    }
}

// ============================================================================
// Inputs and payloads
// ============================================================================

#[derive(Debug, Clone, InputObject)]
pub struct AddReviewInput {
    /// Integer from 1 to 5
    pub rating: i32,
    pub text: String,
}

/// Omitted fields keep their stored value
#[derive(Debug, Clone, Default, InputObject)]
pub struct UpdateReviewInput {
    pub rating: Option<i32>,
    pub text: Option<String>,
}

/// Result of a successful sign-in. The token is also set as the session cookie.
#[derive(Debug, Clone, SimpleObject)]
pub struct SignInPayload {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}
