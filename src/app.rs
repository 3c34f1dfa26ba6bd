//! Application state and HTTP router construction.
//!
//! Used by `main` and by the integration tests to build the Axum app.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::config::Config;
use crate::db::Database;
use crate::graphql::{BookshelfSchema, build_schema};
use crate::services::AuthService;

/// Shared state for HTTP handlers (GraphQL, API routes).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub schema: BookshelfSchema,
    pub auth: AuthService,
}

impl AppState {
    /// Wire the auth service and schema around an open database
    pub fn new(config: Arc<Config>, db: Database) -> Self {
        let auth = AuthService::new(db.clone(), config.auth_config());
        let schema = build_schema(db.clone(), auth.clone());

        Self {
            config,
            db,
            schema,
            auth,
        }
    }
}

/// Build the full Axum router: /api, /graphql, health probes and layers.
/// Returns Router<()> (state fully applied) for use with axum::serve.
pub fn build_app(state: AppState) -> Router<()> {
    Router::new()
        // Health endpoints (no auth required)
        .merge(api::health::router())
        .nest("/api", api::covers::router())
        .route(
            "/graphql",
            get(api::graphql::graphiql).post(api::graphql::graphql_handler),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
