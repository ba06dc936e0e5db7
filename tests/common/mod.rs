#![allow(dead_code)]

use actix_web::web;
use account_server::{AppState, Settings};
use serde_json::Value;

/// Fresh application state over its own in-memory database.
pub async fn test_state(auth_enabled: bool) -> web::Data<AppState> {
    let mut config = Settings::new_for_test().expect("Failed to load test config");
    config.auth.enabled = auth_enabled;
    let state = AppState::new(config).await.expect("Failed to build app state");
    web::Data::new(state)
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

pub fn str_field<'a>(body: &'a Value, pointer: &str) -> &'a str {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_else(|| panic!("missing string at {} in {}", pointer, body))
}
