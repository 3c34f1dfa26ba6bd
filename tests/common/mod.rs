//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use async_graphql::{Request, Response, Variables};
use bookshelf::AppState;
use bookshelf::config::Config;
use bookshelf::db::{CreateBook, Database, UserRecord};
use bookshelf::graphql::SessionUser;
use chrono::Utc;
use serde_json::Value;

pub const TEST_SECRET: &str = "integration-test-secret";

pub fn test_config() -> Config {
    Config {
        session_secret: TEST_SECRET.to_string(),
        session_secret_generated: false,
        bcrypt_cost: 4,
        ..Default::default()
    }
}

/// App state over a fresh in-memory database
pub async fn test_state() -> AppState {
    let db = Database::connect_in_memory().await.unwrap();
    AppState::new(Arc::new(test_config()), db)
}

pub fn session_for(user: &UserRecord) -> SessionUser {
    SessionUser {
        user_id: user.id.clone(),
        email: user.email.clone(),
        issued_at: Utc::now(),
    }
}

/// Execute an operation against the schema, optionally as a signed-in user
pub async fn execute(
    state: &AppState,
    query: &str,
    variables: Value,
    session: Option<&SessionUser>,
) -> Value {
    let mut request = Request::new(query).variables(Variables::from_json(variables));
    if let Some(session) = session {
        request = request.data(session.clone());
    }

    let response: Response = state.schema.execute(request).await;
    serde_json::to_value(&response).unwrap()
}

/// `extensions.code` of the first error, if any
pub fn error_code(response: &Value) -> Option<&str> {
    response["errors"][0]["extensions"]["code"].as_str()
}

pub fn error_message(response: &Value) -> Option<&str> {
    response["errors"][0]["message"].as_str()
}

pub async fn sign_up(state: &AppState, email: &str, password: &str) -> UserRecord {
    state.auth.sign_up(email, password).await.unwrap()
}

pub async fn create_book(state: &AppState, title: &str) -> String {
    state
        .db
        .books()
        .create(CreateBook {
            title: title.to_string(),
            description: Some(format!("About {}", title)),
            cover: None,
        })
        .await
        .unwrap()
        .id
}
