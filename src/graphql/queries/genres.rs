use super::prelude::*;

#[derive(Default)]
pub struct GenreQueries;

#[Object]
impl GenreQueries {
    /// Get a genre by ID or slug
    async fn genre(&self, ctx: &Context<'_>, id_or_slug: String) -> Result<Option<Genre>> {
        let db = ctx.data_unchecked::<Database>();
        let record = db.genres().get_by_id_or_slug(&id_or_slug).await.gql()?;
        Ok(record.map(Genre::from))
    }

    /// Genres whose name contains the query
    async fn genres(&self, ctx: &Context<'_>, query: Option<String>) -> Result<Vec<Genre>> {
        let db = ctx.data_unchecked::<Database>();
        let query = query.unwrap_or_default();
        let records = db.genres().search(query.trim()).await.gql()?;
        Ok(records.into_iter().map(Genre::from).collect())
    }
}
