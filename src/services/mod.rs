//! Application services

pub mod auth;
pub mod logging;
pub mod rating;
pub mod text_utils;

pub use auth::{AuthConfig, AuthService, SESSION_COOKIE, SessionClaims, SessionToken};
pub use logging::{LogFormat, init_tracing};
pub use rating::book_rating;
