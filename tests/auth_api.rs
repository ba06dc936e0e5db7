use actix_web::http::header::ContentType;
use actix_web::{test, App};
use account_server::configure;
use serde_json::{json, Value};

mod common;
use common::{bearer, str_field, test_state};

#[actix_web::test]
async fn test_signup_and_login() {
    let state = test_state(true).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let signup_response = test::TestRequest::post()
        .uri("/api/v1/auth/signup")
        .set_json(json!({
            "username": "alice",
            "email": "alice@example.com",
            "first_name": "Alice",
            "last_name": "Liddell",
            "password": "password123"
        }))
        .send_request(&app)
        .await;

    assert_eq!(signup_response.status(), 201);
    let body: Value = test::read_body_json(signup_response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "User created successfully");
    assert_eq!(str_field(&body, "/data/user/username"), "alice");
    assert_eq!(str_field(&body, "/data/user/email"), "alice@example.com");
    assert_eq!(str_field(&body, "/data/user/first_name"), "Alice");
    assert!(body["data"]["user"]["id"].is_i64());
    assert!(body["data"]["user"].get("password_hash").is_none());
    assert!(!str_field(&body, "/data/access").is_empty());
    assert!(!str_field(&body, "/data/refresh").is_empty());

    let login_response = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({
            "username": "alice",
            "password": "password123"
        }))
        .send_request(&app)
        .await;

    assert_eq!(login_response.status(), 200);
    let body: Value = test::read_body_json(login_response).await;
    assert_eq!(body["message"], "Login successful");
    assert_eq!(str_field(&body, "/data/user/username"), "alice");
    assert!(!str_field(&body, "/data/access").is_empty());
    assert!(!str_field(&body, "/data/refresh").is_empty());

    let account = state.db.find_account_by_username("alice").await.unwrap().unwrap();
    assert!(account.last_login.is_some());
}

#[actix_web::test]
async fn test_signup_duplicate_username_conflicts() {
    let state = test_state(true).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let payload = json!({ "username": "bob", "password": "password123" });
    let first = test::TestRequest::post()
        .uri("/api/v1/auth/signup")
        .set_json(&payload)
        .send_request(&app)
        .await;
    assert_eq!(first.status(), 201);

    let second = test::TestRequest::post()
        .uri("/api/v1/auth/signup")
        .set_json(json!({ "username": "bob", "password": "different456" }))
        .send_request(&app)
        .await;
    assert_eq!(second.status(), 409);
    let body: Value = test::read_body_json(second).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error_code"], "USERNAME_TAKEN");
    assert_eq!(body["message"], "Username already exists");

    assert_eq!(state.db.count_accounts().await.unwrap(), 1);
}

#[actix_web::test]
async fn test_signup_without_password_when_auth_enabled() {
    let state = test_state(true).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let response = test::TestRequest::post()
        .uri("/api/v1/auth/signup")
        .set_json(json!({ "username": "carol", "password": "" }))
        .send_request(&app)
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["message"], "Validation Error");
    assert_eq!(body["error_code"], "VALIDATION_ERROR");
    assert_eq!(
        body["errors"]["password"][0],
        "Password is required when Auth is enabled."
    );
    assert_eq!(state.db.count_accounts().await.unwrap(), 0);
}

#[actix_web::test]
async fn test_signup_whitespace_password_when_auth_enabled() {
    let state = test_state(true).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let response = test::TestRequest::post()
        .uri("/api/v1/auth/signup")
        .set_json(json!({ "username": "ws", "password": "   " }))
        .send_request(&app)
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["error_code"], "VALIDATION_ERROR");
    assert_eq!(
        body["errors"]["password"][0],
        "Password is required when Auth is enabled."
    );
    assert_eq!(state.db.count_accounts().await.unwrap(), 0);

    let signup = test::TestRequest::post()
        .uri("/api/v1/auth/signup")
        .set_json(json!({ "username": "ws", "password": " padded-pass " }))
        .send_request(&app)
        .await;
    assert_eq!(signup.status(), 201);

    let login = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "username": "ws", "password": "padded-pass" }))
        .send_request(&app)
        .await;
    assert_eq!(login.status(), 200);

    let blank_login = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "username": "ws", "password": "   " }))
        .send_request(&app)
        .await;
    assert_eq!(blank_login.status(), 401);
}

#[actix_web::test]
async fn test_signup_missing_username() {
    let state = test_state(true).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let response = test::TestRequest::post()
        .uri("/api/v1/auth/signup")
        .set_json(json!({ "email": "nope", "password": "password123" }))
        .send_request(&app)
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["errors"]["username"][0], "This field is required.");
    assert_eq!(body["errors"]["email"][0], "Enter a valid email address.");
}

#[actix_web::test]
async fn test_signup_with_phone_creates_profile() {
    let state = test_state(true).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let response = test::TestRequest::post()
        .uri("/api/v1/auth/signup")
        .set_json(json!({
            "username": "dave",
            "password": "password123",
            "phone_number": "555-0100"
        }))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 201);
    let body: Value = test::read_body_json(response).await;
    let account_id = body["data"]["user"]["id"].as_i64().unwrap();

    let profile = state.db.find_profile(account_id).await.unwrap().unwrap();
    assert_eq!(profile.phone_number.as_deref(), Some("555-0100"));
}

#[actix_web::test]
async fn test_invalid_login() {
    let state = test_state(true).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    test::TestRequest::post()
        .uri("/api/v1/auth/signup")
        .set_json(json!({ "username": "erin", "password": "password123" }))
        .send_request(&app)
        .await;

    for payload in [
        json!({ "username": "erin", "password": "wrongpassword" }),
        json!({ "username": "erin" }),
        json!({ "username": "nonexistent", "password": "password123" }),
    ] {
        let response = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(&payload)
            .send_request(&app)
            .await;

        assert_eq!(response.status(), 401);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error_code"], "INVALID_CREDENTIALS");
        assert_eq!(body["message"], "Invalid credentials");
    }
}

#[actix_web::test]
async fn test_auth_disabled_signup_and_username_only_login() {
    let state = test_state(false).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let first = test::TestRequest::post()
        .uri("/api/v1/auth/signup")
        .set_json(json!({ "username": "frank", "password": "ignored-password" }))
        .send_request(&app)
        .await;
    assert_eq!(first.status(), 201);
    let first: Value = test::read_body_json(first).await;

    // Same username again is fetched, not rejected.
    let second = test::TestRequest::post()
        .uri("/api/v1/auth/signup")
        .set_json(json!({ "username": "frank" }))
        .send_request(&app)
        .await;
    assert_eq!(second.status(), 200);
    let second: Value = test::read_body_json(second).await;
    assert_eq!(second["data"]["user"]["id"], first["data"]["user"]["id"]);

    let account = state.db.find_account_by_username("frank").await.unwrap().unwrap();
    assert!(!account.has_usable_password());

    let login = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "username": "frank", "password": "anything" }))
        .send_request(&app)
        .await;
    assert_eq!(login.status(), 200);
    let login: Value = test::read_body_json(login).await;
    assert!(!str_field(&login, "/data/access").is_empty());

    let unknown = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "username": "ghost" }))
        .send_request(&app)
        .await;
    assert_eq!(unknown.status(), 401);
}

#[actix_web::test]
async fn test_me_requires_access_token() {
    let state = test_state(true).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let signup = test::TestRequest::post()
        .uri("/api/v1/auth/signup")
        .set_json(json!({ "username": "grace", "password": "password123" }))
        .send_request(&app)
        .await;
    let signup: Value = test::read_body_json(signup).await;
    let access = str_field(&signup, "/data/access").to_string();
    let refresh = str_field(&signup, "/data/refresh").to_string();

    let anonymous = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .send_request(&app)
        .await;
    assert_eq!(anonymous.status(), 401);
    let body: Value = test::read_body_json(anonymous).await;
    assert_eq!(body["error_code"], "NOT_AUTHENTICATED");

    let with_refresh = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&refresh))
        .send_request(&app)
        .await;
    assert_eq!(with_refresh.status(), 401);
    let body: Value = test::read_body_json(with_refresh).await;
    assert_eq!(body["error_code"], "TOKEN_INVALID");

    let me = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&access))
        .send_request(&app)
        .await;
    assert_eq!(me.status(), 200);
    let body: Value = test::read_body_json(me).await;
    assert_eq!(body["message"], "User info retrieved");
    assert_eq!(str_field(&body, "/data/user/username"), "grace");
}

#[actix_web::test]
async fn test_refresh_issues_working_access_token() {
    let state = test_state(true).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let signup = test::TestRequest::post()
        .uri("/api/v1/auth/signup")
        .set_json(json!({ "username": "heidi", "password": "password123" }))
        .send_request(&app)
        .await;
    let signup: Value = test::read_body_json(signup).await;
    let refresh = str_field(&signup, "/data/refresh").to_string();

    let response = test::TestRequest::post()
        .uri("/api/v1/auth/token/refresh")
        .set_json(json!({ "refresh": refresh }))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = test::read_body_json(response).await;
    let access = str_field(&body, "/data/access").to_string();

    let me = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&access))
        .send_request(&app)
        .await;
    assert_eq!(me.status(), 200);

    let bogus = test::TestRequest::post()
        .uri("/api/v1/auth/token/refresh")
        .set_json(json!({ "refresh": "not-a-token" }))
        .send_request(&app)
        .await;
    assert_eq!(bogus.status(), 401);
}

#[actix_web::test]
async fn test_malformed_json_uses_error_envelope() {
    let state = test_state(true).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let response = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .insert_header(ContentType::json())
        .set_payload("{\"username\": ")
        .send_request(&app)
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error_code"], "BAD_REQUEST");
    assert_eq!(body["status"], 400);
}
