//! GraphQL HTTP endpoint
//!
//! `POST /graphql` executes operations. Session tokens are read from the
//! `Authorization: Bearer` header and the session cookie, in that order; the first
//! one that verifies becomes a [SessionUser] in the request data. Invalid tokens are
//! skipped, and with none left the request proceeds anonymously.
//!
//! Cookie sessions slide: once a token is older than the update age, the response
//! carries a re-issued cookie.

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::extract::State;
use axum::http::header::{ACCEPT, AUTHORIZATION, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::AppState;
use crate::graphql::SessionUser;
use crate::services::{SESSION_COOKIE, SessionToken};

/// Where a session token was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenSource {
    Header,
    Cookie,
}

/// Extract bearer token from Authorization header
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Candidate session tokens, header first
fn session_tokens(headers: &HeaderMap, jar: &CookieJar) -> Vec<(String, TokenSource)> {
    let cookie = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty());

    bearer_token(headers)
        .map(|t| (t, TokenSource::Header))
        .into_iter()
        .chain(cookie.map(|t| (t, TokenSource::Cookie)))
        .collect()
}

/// GraphQL query/mutation handler with session context
pub async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    req: GraphQLRequest,
) -> Response {
    let mut request = req.into_inner();
    let mut refreshed: Option<SessionToken> = None;

    let verified = session_tokens(&headers, &jar)
        .into_iter()
        .find_map(|(token, source)| match state.auth.verify_session(&token) {
            Ok(claims) => Some((claims, source)),
            Err(e) => {
                tracing::debug!(error = %e, ?source, "Ignoring invalid session token");
                None
            }
        });

    if let Some((claims, source)) = verified {
        if source == TokenSource::Cookie && state.auth.needs_refresh(&claims) {
            match state.auth.refresh_session(&claims) {
                Ok(session) => refreshed = Some(session),
                Err(e) => tracing::warn!(error = %e, "Failed to refresh session"),
            }
        }
        request = request.data(SessionUser::from(claims));
    }

    let mut response = state.schema.execute(request).await;

    // Sign-in and sign-out set their own cookie; theirs wins.
    if let Some(session) = refreshed
        && !response.http_headers.contains_key(SET_COOKIE)
        && let Ok(value) = HeaderValue::from_str(&state.auth.session_cookie(&session).to_string())
    {
        response.http_headers.append(SET_COOKIE, value);
    }

    GraphQLResponse::from(response).into_response()
}

/// GraphiQL interactive playground (only for browsers)
pub async fn graphiql(headers: HeaderMap) -> impl IntoResponse {
    let accepts_html = headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/html"))
        .unwrap_or(false);

    if accepts_html {
        Html(GraphiQLSource::build().endpoint("/graphql").finish()).into_response()
    } else {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            axum::Json(serde_json::json!({
                "error": "GET requests are not supported for GraphQL queries. Use POST with Content-Type: application/json"
            })),
        )
            .into_response()
    }
}
