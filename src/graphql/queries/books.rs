use super::prelude::*;

const MAX_POPULAR_LIMIT: i32 = 100;

#[derive(Default)]
pub struct BookQueries;

#[Object]
impl BookQueries {
    /// Get a book by ID or slug
    async fn book(&self, ctx: &Context<'_>, id_or_slug: String) -> Result<Option<Book>> {
        let db = ctx.data_unchecked::<Database>();
        let record = db.books().get_by_id_or_slug(&id_or_slug).await.gql()?;
        Ok(record.map(Book::from))
    }

    /// Search books by title, genre name or author name (case-insensitive).
    /// Without a query every book is returned.
    async fn books(&self, ctx: &Context<'_>, query: Option<String>) -> Result<Vec<Book>> {
        let db = ctx.data_unchecked::<Database>();
        let query = query.unwrap_or_default();
        let records = db.books().search(query.trim()).await.gql()?;

        tracing::debug!(query = %query, count = records.len(), "Searched books");

        Ok(records.into_iter().map(Book::from).collect())
    }

    /// Books found in the most libraries
    async fn popular_books(
        &self,
        ctx: &Context<'_>,
        #[graphql(default = 20)] limit: i32,
    ) -> Result<Vec<Book>> {
        let db = ctx.data_unchecked::<Database>();
        let limit = limit.clamp(1, MAX_POPULAR_LIMIT);
        let records = db.books().list_popular(i64::from(limit)).await.gql()?;
        Ok(records.into_iter().map(Book::from).collect())
    }
}
