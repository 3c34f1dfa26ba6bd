pub mod authors;
pub mod books;
pub mod genres;
pub mod user;

pub use authors::AuthorQueries;
pub use books::BookQueries;
pub use genres::GenreQueries;
pub use user::UserQueries;

pub(crate) mod prelude {
    pub(crate) use async_graphql::{Context, Object, Result};

    pub(crate) use crate::db::Database;
    pub(crate) use crate::graphql::auth::current_user;
    pub(crate) use crate::graphql::error::ApiResultExt;
    pub(crate) use crate::graphql::types::*;
}
