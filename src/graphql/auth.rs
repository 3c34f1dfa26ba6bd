//! GraphQL authentication context
//!
//! The HTTP handler verifies the session token and attaches a [SessionUser] to the
//! request data. Resolvers that act on behalf of a user call [current_user], which
//! re-loads the user row so that a session for a deleted user is rejected.

use async_graphql::Context;
use chrono::{DateTime, Utc};

use crate::db::{Database, UserRecord};
use crate::graphql::error::ApiError;
use crate::services::SessionClaims;
use crate::services::auth::issued_at;

/// Identity extracted from a verified session token
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: String,
    pub email: String,
    pub issued_at: DateTime<Utc>,
}

impl From<SessionClaims> for SessionUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            issued_at: issued_at(&claims),
            user_id: claims.sub,
            email: claims.email,
        }
    }
}

/// Extension trait to get the session from GraphQL context
pub trait AuthExt {
    /// Get the session, or Unauthenticated if the request carries none
    fn session_user(&self) -> Result<&SessionUser, ApiError>;

    /// Get the session if present
    fn try_session_user(&self) -> Option<&SessionUser>;
}

impl<'a> AuthExt for Context<'a> {
    fn session_user(&self) -> Result<&SessionUser, ApiError> {
        self.data_opt::<SessionUser>().ok_or(ApiError::Unauthenticated)
    }

    fn try_session_user(&self) -> Option<&SessionUser> {
        self.data_opt::<SessionUser>()
    }
}

/// Load the caller's user row. Missing session or missing user is Unauthenticated.
pub async fn current_user(ctx: &Context<'_>) -> Result<UserRecord, ApiError> {
    let session = ctx.session_user()?;
    let db = ctx.data_unchecked::<Database>();

    match db.users().get_by_id(&session.user_id).await? {
        Some(user) => Ok(user),
        None => {
            tracing::debug!(user_id = %session.user_id, "Session refers to a missing user");
            Err(ApiError::Unauthenticated)
        }
    }
}
