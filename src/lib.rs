//! Bookshelf - book catalog and review service
//!
//! Users browse books, authors and genres, keep a personal library and post
//! reviews. Everything is exposed through GraphQL at /graphql.

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod graphql;
pub mod services;

pub use app::{AppState, build_app};
