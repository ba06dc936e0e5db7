use actix_web::{test, App};
use account_server::configure;
use chrono::DateTime;

mod common;

#[actix_web::test]
async fn test_health_check() {
    let state = common::test_state(true).await;

    // Create test app
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    // Send request
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    // Assert response
    assert!(resp.status().is_success());

    // Parse response body
    let body = test::read_body(resp).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    // Verify response format
    assert_eq!(json["status"], "healthy");
    assert!(DateTime::parse_from_rfc3339(
        json["timestamp"].as_str().unwrap()
    ).is_ok());
}

#[actix_web::test]
async fn test_schema_is_served() {
    let state = common::test_state(true).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let req = test::TestRequest::get().uri("/api/v1/schema").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let json: serde_json::Value = test::read_body_json(resp).await;
    assert!(json["openapi"].as_str().unwrap().starts_with("3."));
    assert!(json["paths"]["/api/v1/auth/signup"]["post"].is_object());
    assert!(json["paths"]["/api/v1/profile/me"]["get"]["security"].is_array());
}
