//! GraphQL DataLoaders for batching database queries
//!
//! A list of books that each resolve `rating` and `reviewCount` would otherwise issue
//! one reviews query per book. [RatingLoader] collects the book ids requested within
//! the same tick and fetches all their ratings in a single `IN (...)` query.

use std::collections::HashMap;
use std::sync::Arc;

use async_graphql::dataloader::Loader;

use crate::db::Database;

/// Loads the ratings of every review for a batch of book ids.
///
/// Books without reviews are absent from the result map; callers treat that as an
/// empty list.
pub struct RatingLoader {
    db: Database,
}

impl RatingLoader {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl Loader<String> for RatingLoader {
    type Value = Vec<i64>;
    type Error = Arc<anyhow::Error>;

    async fn load(&self, keys: &[String]) -> Result<HashMap<String, Self::Value>, Self::Error> {
        tracing::debug!(book_count = keys.len(), "Batch loading book ratings");

        self.db.books().ratings_for(keys).await.map_err(Arc::new)
    }
}
