//! Authentication service: credential sign-up/sign-in and session tokens
//!
//! Provides:
//! - User registration with bcrypt password hashing
//! - Credential login
//! - HS256 session token issue/verify with a sliding refresh window

use std::sync::Arc;

use anyhow::{Result, anyhow};
use axum_extra::extract::cookie::{Cookie, SameSite};
use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::db::{CreateUser, Database, UserRecord};
use crate::db::sqlite_helpers::is_unique_violation;
use crate::graphql::error::ApiError;
use crate::services::text_utils::{is_blank, normalize_email};

// ============================================================================
// Session Claims
// ============================================================================

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID (subject)
    pub sub: String,
    pub email: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// A freshly signed session token
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

// ============================================================================
// Configuration
// ============================================================================

/// Auth service configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub session_secret: String,
    /// Session lifetime in seconds (default: 30 days)
    pub session_max_age: i64,
    /// Age in seconds after which a still-valid session is re-issued (default: 24 hours)
    pub session_update_age: i64,
    pub bcrypt_cost: u32,
    /// Mark the session cookie `Secure` (HTTPS only)
    pub cookie_secure: bool,
}

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "bookshelf.session-token";

impl AuthConfig {
    pub const DEFAULT_MAX_AGE: i64 = 30 * 24 * 60 * 60;
    pub const DEFAULT_UPDATE_AGE: i64 = 24 * 60 * 60;
    pub const DEFAULT_BCRYPT_COST: u32 = 10;
}

// ============================================================================
// Auth Service
// ============================================================================

/// Password checked against [AuthService::dummy_hash] when the email is unknown
const DUMMY_PASSWORD: &str = "bookshelf-dummy-password";

#[derive(Clone)]
pub struct AuthService {
    db: Database,
    config: AuthConfig,
    /// Hash at the configured cost, built on the first unknown-email sign-in
    dummy_hash: Arc<OnceCell<String>>,
}

impl AuthService {
    pub fn new(db: Database, config: AuthConfig) -> Self {
        Self {
            db,
            config,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Register a new user with an email and password
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<UserRecord, ApiError> {
        if is_blank(email) || is_blank(password) {
            return Err(ApiError::validation("Email and password are required"));
        }

        let email = normalize_email(email);
        if !email.contains('@') {
            return Err(ApiError::validation("Email is not valid"));
        }

        let users = self.db.users();
        if users.get_by_email(&email).await?.is_some() {
            return Err(ApiError::conflict("The user already exists"));
        }

        let password_hash = self.hash_password(password)?;

        match users.create(CreateUser { email, password_hash }).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "User signed up");
                Ok(user)
            }
            // Lost a race with a concurrent sign-up for the same email
            Err(e) if is_unique_violation(&e) => Err(ApiError::conflict("The user already exists")),
            Err(e) => Err(e.into()),
        }
    }

    /// Check credentials and issue a session token.
    ///
    /// An unknown email and a wrong password fail identically.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(UserRecord, SessionToken), ApiError> {
        let email = normalize_email(email);

        let Some(user) = self.db.users().get_by_email(&email).await? else {
            // Same bcrypt work as a wrong password
            self.verify_password(password, self.dummy_hash()?)?;
            tracing::debug!("Sign-in for unknown email");
            return Err(ApiError::InvalidCredentials);
        };

        if !self.verify_password(password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "Sign-in with wrong password");
            return Err(ApiError::InvalidCredentials);
        }

        let token = self.issue_session(&user)?;
        tracing::info!(user_id = %user.id, "User signed in");

        Ok((user, token))
    }

    // ========================================================================
    // Session Tokens
    // ========================================================================

    /// Sign a session token for a user
    pub fn issue_session(&self, user: &UserRecord) -> Result<SessionToken> {
        self.encode_session(&user.id, &user.email, Utc::now())
    }

    /// Re-sign an existing session with a fresh issue time
    pub fn refresh_session(&self, claims: &SessionClaims) -> Result<SessionToken> {
        self.encode_session(&claims.sub, &claims.email, Utc::now())
    }

    /// Decode and validate a session token
    pub fn verify_session(&self, token: &str) -> Result<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let token_data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.config.session_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| anyhow!("Invalid session token: {}", e))?;

        Ok(token_data.claims)
    }

    /// True once a valid session is old enough to be re-issued
    pub fn needs_refresh(&self, claims: &SessionClaims) -> bool {
        Utc::now().timestamp() - claims.iat >= self.config.session_update_age
    }

    fn encode_session(
        &self,
        user_id: &str,
        email: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<SessionToken> {
        let expires_at = issued_at + Duration::seconds(self.config.session_max_age);

        let claims = SessionClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.session_secret.as_bytes()),
        )
        .map_err(|e| anyhow!("Failed to create session token: {}", e))?;

        Ok(SessionToken { token, expires_at })
    }

    /// Cookie carrying a session token, expiring with the token
    pub fn session_cookie(&self, session: &SessionToken) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, session.token.clone()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.config.cookie_secure)
            .max_age(time::Duration::seconds(self.config.session_max_age))
            .build()
    }

    /// Cookie that makes the browser drop the session
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.config.cookie_secure)
            .build();
        cookie.make_removal();
        cookie
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    /// Hash a password with bcrypt
    fn hash_password(&self, password: &str) -> Result<String> {
        hash(password, self.config.bcrypt_cost)
            .map_err(|e| anyhow!("Failed to hash password: {}", e))
    }

    /// Verify a password against a hash
    fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        verify(password, hash).map_err(|e| anyhow!("Failed to verify password: {}", e))
    }

    fn dummy_hash(&self) -> Result<&str> {
        self.dummy_hash
            .get_or_try_init(|| self.hash_password(DUMMY_PASSWORD))
            .map(String::as_str)
    }
}

/// Issue time of a session as a UTC timestamp
pub fn issued_at(claims: &SessionClaims) -> DateTime<Utc> {
    Utc.timestamp_opt(claims.iat, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            session_secret: "test-secret".to_string(),
            session_max_age: AuthConfig::DEFAULT_MAX_AGE,
            session_update_age: AuthConfig::DEFAULT_UPDATE_AGE,
            bcrypt_cost: 4,
            cookie_secure: false,
        }
    }

    async fn service() -> AuthService {
        let db = Database::connect_in_memory().await.unwrap();
        AuthService::new(db, test_config())
    }

    #[tokio::test]
    async fn test_sign_up_hashes_and_normalizes() {
        let auth = service().await;

        let user = auth.sign_up("  Reader@Example.com ", "hunter22").await.unwrap();
        assert_eq!(user.email, "reader@example.com");
        assert_ne!(user.password_hash, "hunter22");
        assert!(user.password_hash.starts_with("$2"));
    }

    #[tokio::test]
    async fn test_sign_up_validation() {
        let auth = service().await;

        assert_matches!(auth.sign_up("", "pw").await, Err(ApiError::Validation(_)));
        assert_matches!(auth.sign_up("a@b.c", "   ").await, Err(ApiError::Validation(_)));
        assert_matches!(auth.sign_up("not-an-email", "pw").await, Err(ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_conflicts() {
        let auth = service().await;

        auth.sign_up("dup@example.com", "pw").await.unwrap();
        assert_matches!(
            auth.sign_up("DUP@example.com", "other").await,
            Err(ApiError::Conflict(_))
        );
    }

    #[tokio::test]
    async fn test_sign_in_failures_are_indistinguishable() {
        let auth = service().await;
        auth.sign_up("known@example.com", "right").await.unwrap();

        let unknown = auth.sign_in("nobody@example.com", "right").await.unwrap_err();
        let wrong = auth.sign_in("known@example.com", "wrong").await.unwrap_err();

        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(unknown.code(), wrong.code());
    }

    #[tokio::test]
    async fn test_unknown_email_still_runs_bcrypt() {
        let auth = service().await;
        assert!(auth.dummy_hash.get().is_none());

        let err = auth.sign_in("nobody@example.com", "pw").await.unwrap_err();
        assert_matches!(err, ApiError::InvalidCredentials);

        // Hashed at the configured cost, so the verify costs the same as a real one
        let dummy = auth.dummy_hash.get().unwrap();
        assert!(dummy.starts_with("$2b$04$"), "{}", dummy);

        // Built once and reused
        auth.sign_in("other@example.com", "pw").await.unwrap_err();
        assert_eq!(auth.dummy_hash.get().unwrap(), dummy);
    }

    #[tokio::test]
    async fn test_sign_in_issues_verifiable_token() {
        let auth = service().await;
        let user = auth.sign_up("me@example.com", "pw").await.unwrap();

        let (signed_in, token) = auth.sign_in("ME@example.com", "pw").await.unwrap();
        assert_eq!(signed_in.id, user.id);

        let claims = auth.verify_session(&token.token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "me@example.com");
        assert_eq!(claims.exp - claims.iat, AuthConfig::DEFAULT_MAX_AGE);
        assert!(!auth.needs_refresh(&claims));
    }

    #[tokio::test]
    async fn test_rejects_foreign_and_expired_tokens() {
        let auth = service().await;
        let user = auth.sign_up("me@example.com", "pw").await.unwrap();

        let other = AuthService::new(
            auth.db.clone(),
            AuthConfig {
                session_secret: "another-secret".to_string(),
                ..test_config()
            },
        );
        let foreign = other.issue_session(&user).unwrap();
        assert!(auth.verify_session(&foreign.token).is_err());

        let expired = auth
            .encode_session(&user.id, &user.email, Utc::now() - Duration::days(31))
            .unwrap();
        assert!(auth.verify_session(&expired.token).is_err());
        assert!(auth.verify_session("garbage").is_err());
    }

    #[tokio::test]
    async fn test_needs_refresh_after_update_age() {
        let auth = service().await;
        let user = auth.sign_up("me@example.com", "pw").await.unwrap();

        let old = auth
            .encode_session(&user.id, &user.email, Utc::now() - Duration::hours(25))
            .unwrap();
        let claims = auth.verify_session(&old.token).unwrap();
        assert!(auth.needs_refresh(&claims));

        let refreshed = auth.refresh_session(&claims).unwrap();
        let new_claims = auth.verify_session(&refreshed.token).unwrap();
        assert_eq!(new_claims.sub, user.id);
        assert!(!auth.needs_refresh(&new_claims));
    }

    #[tokio::test]
    async fn test_session_cookies() {
        let auth = service().await;
        let user = auth.sign_up("me@example.com", "pw").await.unwrap();
        let session = auth.issue_session(&user).unwrap();

        let cookie = auth.session_cookie(&session);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), session.token);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(
            cookie.max_age(),
            Some(time::Duration::seconds(AuthConfig::DEFAULT_MAX_AGE))
        );

        let removal = auth.removal_cookie();
        assert_eq!(removal.value(), "");
        assert_eq!(removal.max_age(), Some(time::Duration::ZERO));
    }
}
