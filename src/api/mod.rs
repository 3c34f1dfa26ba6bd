//! HTTP routes
//!
//! The primary API is GraphQL at /graphql. REST is used only where GraphQL fits
//! poorly: binary cover images and health probes.

pub mod covers;
pub mod graphql;
pub mod health;
