//! GraphQL API
//!
//! The single API surface of the bookshelf service: catalog queries, the caller's
//! library and reviews, and session sign-in/out.

pub mod auth;
pub mod error;
pub mod loaders;
pub mod mutations;
pub mod queries;
mod schema;
pub mod types;

pub use auth::{AuthExt, SessionUser};
pub use error::ApiError;
pub use schema::{BookshelfSchema, MutationRoot, QueryRoot, build_schema};
