//! Book cover serving endpoint
//!
//! Serves cover images stored in the database. The content type is sniffed from
//! the bytes and the ETag is the SHA-256 of the image, so clients can revalidate
//! with `If-None-Match`.

use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use sha2::{Digest, Sha256};

use crate::AppState;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Serve a book cover
///
/// GET /api/books/{id_or_slug}/cover
async fn serve_cover(
    State(state): State<AppState>,
    Path(id_or_slug): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let cover = match state.db.books().get_cover(&id_or_slug).await {
        Ok(Some(cover)) => cover,
        Ok(None) => return (StatusCode::NOT_FOUND, "Cover not found").into_response(),
        Err(e) => {
            tracing::error!(error = %e, id_or_slug = %id_or_slug, "Failed to retrieve cover");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to retrieve cover").into_response();
        }
    };

    let etag = format!("\"{:x}\"", Sha256::digest(&cover));

    if etag_matches(&headers, &etag) {
        return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response();
    }

    let content_type = infer::get(&cover)
        .map(|kind| kind.mime_type())
        .unwrap_or(FALLBACK_CONTENT_TYPE);

    let headers = [
        (header::CONTENT_TYPE, content_type.to_string()),
        (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        (header::ETAG, etag),
    ];
    (StatusCode::OK, headers, cover).into_response()
}

/// True if any entity tag in `If-None-Match` equals `etag` (or is `*`)
fn etag_matches(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(|value| {
            value
                .split(',')
                .map(|tag| tag.trim().trim_start_matches("W/"))
                .any(|tag| tag == etag || tag == "*")
        })
        .unwrap_or(false)
}

pub fn router() -> Router<AppState> {
    Router::new().route("/books/{id_or_slug}/cover", get(serve_cover))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn with_if_none_match(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::IF_NONE_MATCH, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_etag_matching() {
        let etag = "\"abc\"";
        assert!(etag_matches(&with_if_none_match("\"abc\""), etag));
        assert!(etag_matches(&with_if_none_match("\"x\", W/\"abc\""), etag));
        assert!(etag_matches(&with_if_none_match("*"), etag));
        assert!(!etag_matches(&with_if_none_match("\"other\""), etag));
        assert!(!etag_matches(&HeaderMap::new(), etag));
    }
}
