use super::prelude::*;

#[derive(Default)]
pub struct AuthorQueries;

#[Object]
impl AuthorQueries {
    /// Get an author by ID or slug
    async fn author(&self, ctx: &Context<'_>, id_or_slug: String) -> Result<Option<Author>> {
        let db = ctx.data_unchecked::<Database>();
        let record = db.authors().get_by_id_or_slug(&id_or_slug).await.gql()?;
        Ok(record.map(Author::from))
    }

    /// Authors whose name contains the query
    async fn authors(&self, ctx: &Context<'_>, query: Option<String>) -> Result<Vec<Author>> {
        let db = ctx.data_unchecked::<Database>();
        let query = query.unwrap_or_default();
        let records = db.authors().search(query.trim()).await.gql()?;
        Ok(records.into_iter().map(Author::from).collect())
    }
}
