use super::prelude::*;

#[derive(Default)]
pub struct LibraryMutations;

#[Object]
impl LibraryMutations {
    /// Add a book to the caller's library. Adding it twice is a no-op.
    async fn add_book_to_user(&self, ctx: &Context<'_>, book_id: String) -> Result<Book> {
        let user = current_user(ctx).await.gql()?;
        let db = ctx.data_unchecked::<Database>();

        let book = db
            .books()
            .get_by_id(&book_id)
            .await
            .gql()?
            .ok_or(ApiError::NotFound("book"))
            .gql()?;

        let added = db.users().add_book(&user.id, &book.id).await.gql()?;
        tracing::info!(user_id = %user.id, book_id = %book.id, added, "Added book to library");

        Ok(Book::from(book))
    }

    /// Remove a book from the caller's library. Removing an absent book is a no-op.
    async fn remove_book_from_user(&self, ctx: &Context<'_>, book_id: String) -> Result<Book> {
        let user = current_user(ctx).await.gql()?;
        let db = ctx.data_unchecked::<Database>();

        let book = db
            .books()
            .get_by_id(&book_id)
            .await
            .gql()?
            .ok_or(ApiError::NotFound("book"))
            .gql()?;

        let removed = db.users().remove_book(&user.id, &book.id).await.gql()?;
        tracing::info!(user_id = %user.id, book_id = %book.id, removed, "Removed book from library");

        Ok(Book::from(book))
    }
}
