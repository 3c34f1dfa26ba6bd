//! API error taxonomy
//!
//! Every failure a client can see maps to one [ApiError] kind. The kind is
//! exposed to GraphQL clients as `extensions.code`; internal details are logged
//! and replaced by a generic message.

use async_graphql::ErrorExtensions;

use crate::db::sqlite_helpers::{is_check_violation, is_unique_violation};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No session, an invalid token, or a session for a user that no longer exists
    #[error("You are not logged in")]
    Unauthenticated,

    /// Sign-in failure; unknown email and wrong password are deliberately identical
    #[error("Password is incorrect")]
    InvalidCredentials,

    #[error("The {0} does not exist")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Machine-readable code sent in `extensions.code`
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated | Self::InvalidCredentials => "UNAUTHENTICATED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "BAD_USER_INPUT",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if is_unique_violation(&err) {
            return Self::Conflict("The record already exists".to_string());
        }
        if is_check_violation(&err) {
            return Self::Validation("A value is out of range".to_string());
        }
        Self::Internal(err)
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        if let Self::Internal(source) = self {
            tracing::error!(error = ?source, "Request failed with internal error");
        }

        let code = self.code();
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", code))
    }
}

/// Convenience for resolvers: convert a domain result into a GraphQL result
/// carrying the error code.
pub trait ApiResultExt<T> {
    fn gql(self) -> async_graphql::Result<T>;
}

impl<T, E> ApiResultExt<T> for Result<T, E>
where
    E: Into<ApiError>,
{
    fn gql(self) -> async_graphql::Result<T> {
        self.map_err(|e| e.into().extend())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ApiError::Unauthenticated.code(), "UNAUTHENTICATED");
        assert_eq!(ApiError::InvalidCredentials.code(), "UNAUTHENTICATED");
        assert_eq!(ApiError::NotFound("book").code(), "NOT_FOUND");
        assert_eq!(ApiError::validation("bad").code(), "BAD_USER_INPUT");
        assert_eq!(ApiError::conflict("dup").code(), "CONFLICT");
    }

    #[test]
    fn test_internal_error_message_is_opaque() {
        let err: ApiError = anyhow::anyhow!("disk I/O error at /var/db").into();
        assert_eq!(err.code(), "INTERNAL_SERVER_ERROR");

        let gql = err.extend();
        assert_eq!(gql.message, "Internal server error");
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(ApiError::NotFound("review").to_string(), "The review does not exist");
    }

    #[test]
    fn test_extension_code_is_set() {
        let gql = ApiError::Unauthenticated.extend();
        let code = gql
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .cloned();
        assert_eq!(code, Some(async_graphql::Value::from("UNAUTHENTICATED")));
    }
}
