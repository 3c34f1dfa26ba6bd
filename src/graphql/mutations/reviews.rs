//! Review mutations
//!
//! A caller has at most one review per book, so every operation addresses the
//! review by book id. Input is validated before anything is written.

use crate::db::{CreateReview, UpdateReview};
use crate::services::text_utils::is_blank;

use super::prelude::*;

const RATING_RANGE: std::ops::RangeInclusive<i32> = 1..=5;

fn validate_rating(rating: i32) -> Result<(), ApiError> {
    if RATING_RANGE.contains(&rating) {
        Ok(())
    } else {
        Err(ApiError::validation("Rating has to be between 1 and 5"))
    }
}

fn validate_text(text: &str) -> Result<(), ApiError> {
    if is_blank(text) {
        Err(ApiError::validation("Review text cannot be empty"))
    } else {
        Ok(())
    }
}

#[derive(Default)]
pub struct ReviewMutations;

#[Object]
impl ReviewMutations {
    /// Review a book. Each user can review a book once.
    async fn add_review(
        &self,
        ctx: &Context<'_>,
        book_id: String,
        data: AddReviewInput,
    ) -> Result<Review> {
        let user = current_user(ctx).await.gql()?;
        let db = ctx.data_unchecked::<Database>();

        let book = db
            .books()
            .get_by_id(&book_id)
            .await
            .gql()?
            .ok_or(ApiError::NotFound("book"))
            .gql()?;

        validate_rating(data.rating).gql()?;
        validate_text(&data.text).gql()?;

        let reviews = db.reviews();
        if reviews.get_by_user_and_book(&user.id, &book.id).await.gql()?.is_some() {
            return Err(ApiError::conflict("The user already created the review")).gql();
        }

        let review = reviews
            .create(CreateReview {
                user_id: user.id.clone(),
                book_id: book.id.clone(),
                rating: i64::from(data.rating),
                text: data.text,
            })
            .await
            .map_err(|e| match ApiError::from(e) {
                ApiError::Conflict(_) => ApiError::conflict("The user already created the review"),
                other => other,
            })
            .gql()?;

        tracing::info!(user_id = %user.id, book_id = %book.id, rating = review.rating, "Review added");

        Ok(Review::from(review))
    }

    /// Change the caller's review of a book. Omitted fields are kept.
    async fn update_review(
        &self,
        ctx: &Context<'_>,
        book_id: String,
        data: UpdateReviewInput,
    ) -> Result<Review> {
        let user = current_user(ctx).await.gql()?;
        let db = ctx.data_unchecked::<Database>();

        if let Some(rating) = data.rating {
            validate_rating(rating).gql()?;
        }
        if let Some(text) = &data.text {
            validate_text(text).gql()?;
        }

        let review = db
            .reviews()
            .update_by_user_and_book(
                &user.id,
                &book_id,
                UpdateReview {
                    rating: data.rating.map(i64::from),
                    text: data.text,
                },
            )
            .await
            .gql()?
            .ok_or(ApiError::NotFound("review"))
            .gql()?;

        tracing::info!(user_id = %user.id, book_id = %book_id, "Review updated");

        Ok(Review::from(review))
    }

    /// Delete the caller's review of a book, returning it
    async fn delete_review(&self, ctx: &Context<'_>, book_id: String) -> Result<Review> {
        let user = current_user(ctx).await.gql()?;
        let db = ctx.data_unchecked::<Database>();

        let review = db
            .reviews()
            .delete_by_user_and_book(&user.id, &book_id)
            .await
            .gql()?
            .ok_or(ApiError::NotFound("review"))
            .gql()?;

        tracing::info!(user_id = %user.id, book_id = %book_id, "Review deleted");

        Ok(Review::from(review))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert_matches!(validate_rating(0), Err(ApiError::Validation(_)));
        assert_matches!(validate_rating(6), Err(ApiError::Validation(_)));
        assert_matches!(validate_rating(-3), Err(ApiError::Validation(_)));
    }

    #[test]
    fn test_blank_text_rejected() {
        assert_matches!(validate_text("  "), Err(ApiError::Validation(_)));
        assert!(validate_text("Loved it").is_ok());
    }
}
