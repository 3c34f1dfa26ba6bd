pub mod auth;
pub mod library;
pub mod reviews;

pub use auth::AuthMutations;
pub use library::LibraryMutations;
pub use reviews::ReviewMutations;

pub(crate) mod prelude {
    pub(crate) use async_graphql::{Context, Object, Result};

    pub(crate) use crate::db::Database;
    pub(crate) use crate::graphql::auth::current_user;
    pub(crate) use crate::graphql::error::{ApiError, ApiResultExt};
    pub(crate) use crate::graphql::types::*;
    pub(crate) use crate::services::AuthService;
}
