//! Sign-up, sign-in and sign-out
//!
//! None of these require a session. Sign-in and sign-out also set the session
//! cookie on the HTTP response so browser clients need no token handling.

use axum::http::header::SET_COOKIE;

use super::prelude::*;

#[derive(Default)]
pub struct AuthMutations;

#[Object]
impl AuthMutations {
    /// Register a new account. Does not sign the user in.
    async fn sign_up(&self, ctx: &Context<'_>, email: String, password: String) -> Result<User> {
        let auth = ctx.data_unchecked::<AuthService>();

        match auth.sign_up(&email, &password).await {
            Ok(user) => Ok(User::from(user)),
            Err(e) => {
                tracing::warn!(error = %e, code = e.code(), "Sign-up failed");
                Err::<User, _>(e).gql()
            }
        }
    }

    /// Authenticate with email and password
    async fn sign_in(
        &self,
        ctx: &Context<'_>,
        email: String,
        password: String,
    ) -> Result<SignInPayload> {
        let auth = ctx.data_unchecked::<AuthService>();

        let (user, session) = auth.sign_in(&email, &password).await.gql()?;
        ctx.append_http_header(SET_COOKIE, auth.session_cookie(&session).to_string());

        Ok(SignInPayload {
            token: session.token,
            expires_at: session.expires_at,
            user: User::from(user),
        })
    }

    /// Clear the session cookie. Always succeeds.
    async fn sign_out(&self, ctx: &Context<'_>) -> Result<bool> {
        let auth = ctx.data_unchecked::<AuthService>();
        ctx.append_http_header(SET_COOKIE, auth.removal_cookie().to_string());
        Ok(true)
    }
}
