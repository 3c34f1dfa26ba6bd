//! GraphQL schema definition
//!
//! Resolvers live in per-domain `queries/` and `mutations/` modules and are merged
//! here into the query and mutation roots.

use async_graphql::dataloader::DataLoader;
use async_graphql::{EmptySubscription, MergedObject, Schema};

use crate::db::Database;
use crate::services::AuthService;

use super::loaders::RatingLoader;
use super::mutations::{AuthMutations, LibraryMutations, ReviewMutations};
use super::queries::{AuthorQueries, BookQueries, GenreQueries, UserQueries};

/// The GraphQL schema type
pub type BookshelfSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

#[derive(MergedObject, Default)]
pub struct QueryRoot(BookQueries, AuthorQueries, GenreQueries, UserQueries);

#[derive(MergedObject, Default)]
pub struct MutationRoot(AuthMutations, LibraryMutations, ReviewMutations);

/// Build the GraphQL schema with all resolvers
pub fn build_schema(db: Database, auth: AuthService) -> BookshelfSchema {
    let rating_loader = DataLoader::new(RatingLoader::new(db.clone()), tokio::spawn);

    Schema::build(QueryRoot::default(), MutationRoot::default(), EmptySubscription)
        .data(db)
        .data(auth)
        .data(rating_loader)
        .finish()
}
