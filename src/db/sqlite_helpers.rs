//! SQLite helper utilities
//!
//! SQLite has no native UUID or timestamp types, so ids are stored as TEXT and
//! timestamps as RFC 3339 TEXT.

use std::future::Future;

use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteQueryResult;
use uuid::Uuid;

use crate::services::text_utils::slugify;

/// Get current UTC timestamp as an RFC 3339 string for SQLite
#[inline]
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339()
}

/// Generate a new row id
#[inline]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Check whether an error bubbled up from a repository is a unique-constraint violation
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}

/// Check whether an error is a CHECK constraint failure (e.g. rating bounds)
pub fn is_check_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|e| e.is_check_violation())
        .unwrap_or(false)
}

/// Translate an optional page size into a SQLite `LIMIT` value (-1 means no limit)
#[inline]
pub fn limit_or_all(limit: Option<i64>) -> i64 {
    limit.filter(|l| *l >= 0).unwrap_or(-1)
}

/// Derive a slug from `source` that is not yet used in `table`.
///
/// Collisions get a numeric suffix: `dune`, `dune-2`, `dune-3`, ...
pub async fn unique_slug(pool: &SqlitePool, table: &str, source: &str) -> Result<String> {
    let mut base = slugify(source);
    if base.is_empty() {
        base = "untitled".to_string();
    }

    let mut candidate = base.clone();
    let mut suffix = 1;
    loop {
        let taken: Option<(String,)> =
            sqlx::query_as(&format!("SELECT id FROM {} WHERE slug = ?", table))
                .bind(&candidate)
                .fetch_optional(pool)
                .await?;

        if taken.is_none() {
            return Ok(candidate);
        }

        suffix += 1;
        candidate = format!("{}-{}", base, suffix);
    }
}

/// How often [insert_with_unique_slug] re-allocates a slug after losing a race
pub const SLUG_ATTEMPTS: u32 = 5;

/// Allocate a slug with [unique_slug] and run `insert` with it.
///
/// The lookup and the insert are not atomic, so two concurrent creates can pick
/// the same candidate. The loser hits the UNIQUE index and retries with a fresh
/// slug. Returns the slug that was stored.
pub async fn insert_with_unique_slug<F, Fut>(
    pool: &SqlitePool,
    table: &str,
    source: &str,
    mut insert: F,
) -> Result<String>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<SqliteQueryResult, sqlx::Error>>,
{
    let mut attempt = 1;
    loop {
        let slug = unique_slug(pool, table, source).await?;
        match insert(slug.clone()).await {
            Ok(_) => return Ok(slug),
            Err(e) if attempt < SLUG_ATTEMPTS && is_sqlx_unique_violation(&e) => {
                tracing::debug!(table, slug = %slug, attempt, "Slug taken concurrently, retrying");
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn is_sqlx_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_is_uuid() {
        let id = new_id();
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_now_is_rfc3339() {
        let now = now_iso8601();
        assert!(chrono::DateTime::parse_from_rfc3339(&now).is_ok());
    }

    #[test]
    fn test_limit_or_all() {
        assert_eq!(limit_or_all(None), -1);
        assert_eq!(limit_or_all(Some(5)), 5);
        assert_eq!(limit_or_all(Some(-3)), -1);
    }

    #[test]
    fn test_non_sqlx_error_is_not_a_violation() {
        let err = anyhow::anyhow!("something else");
        assert!(!is_unique_violation(&err));
        assert!(!is_check_violation(&err));
    }
}
