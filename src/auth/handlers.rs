use actix_web::{http::StatusCode, web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::auth::extractor::AuthenticatedAccount;
use crate::auth::service::{SignupInput, PASSWORD_REQUIRED};
use crate::auth::tokens::TokenPair;
use crate::db::models::Account;
use crate::error::{AppError, ErrorBody};
use crate::response::{success, success_with_status, ApiResponse};
use crate::validation::{
    expect_object, is_valid_email, is_valid_username, FieldErrors, Fields, EMAIL_MAX_LEN,
    NAME_MAX_LEN, PHONE_MAX_LEN, USERNAME_MAX_LEN,
};
use crate::AppState;

const INVALID_USERNAME: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
const INVALID_EMAIL: &str = "Enter a valid email address.";

/// Public account summary returned by every auth endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&Account> for UserSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            email: account.email.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserSummary,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: UserSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub access: String,
}

/// Signup body. Bodies are checked field by field by `parse_signup`, so this
/// type only describes the accepted shape.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupRequest {
    #[schema(max_length = 150, example = "alice")]
    pub username: String,
    #[schema(max_length = 254)]
    pub email: Option<String>,
    #[schema(max_length = 150)]
    pub first_name: Option<String>,
    #[schema(max_length = 150)]
    pub last_name: Option<String>,
    /// Creates the profile when non-blank.
    #[schema(max_length = 20)]
    pub phone_number: Option<String>,
    /// Required unless auth is disabled.
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    /// Ignored as a credential when auth is disabled.
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh: String,
}

fn parse_signup(body: &Map<String, Value>, auth_enabled: bool) -> Result<SignupInput, FieldErrors> {
    let mut fields = Fields::new(body);

    let username = fields
        .required_str("username", USERNAME_MAX_LEN)
        .map(|u| u.trim().to_string());
    if let Some(username) = &username {
        if !is_valid_username(username) {
            fields.add_error("username", INVALID_USERNAME);
        }
    }

    let email = fields
        .optional_str("email", Some(EMAIL_MAX_LEN))
        .map(|e| e.trim().to_string())
        .unwrap_or_default();
    if !email.is_empty() && !is_valid_email(&email) {
        fields.add_error("email", INVALID_EMAIL);
    }

    let first_name = fields.optional_str("first_name", Some(NAME_MAX_LEN)).unwrap_or_default();
    let last_name = fields.optional_str("last_name", Some(NAME_MAX_LEN)).unwrap_or_default();
    let phone_number = fields.optional_str("phone_number", Some(PHONE_MAX_LEN));
    let password = fields
        .optional_str("password", None)
        .map(|p| p.trim().to_string());

    let missing_password = password.as_deref().map_or(true, str::is_empty);
    if auth_enabled && missing_password && !fields.has_error("password") {
        fields.add_error("password", PASSWORD_REQUIRED);
    }

    fields.finish()?;
    Ok(SignupInput {
        username: username.unwrap_or_default(),
        email,
        first_name,
        last_name,
        phone_number,
        password,
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<AuthResponse>),
        (status = 200, description = "Existing account signed in (auth disabled)", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 409, description = "Username already taken", body = ErrorBody),
    )
)]
pub async fn signup(
    req: web::Json<Value>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let body = expect_object(&req)?;
    let input = parse_signup(body, state.auth_service.auth_enabled()).map_err(|errors| {
        warn!("Signup payload rejected: {}", errors);
        AppError::ValidationError(errors)
    })?;
    info!("Received signup request for username: {}", input.username);

    let outcome = state.auth_service.signup(input).await?;
    let (status, message) = if outcome.created {
        (StatusCode::CREATED, "User created successfully")
    } else {
        (StatusCode::OK, "User signed in")
    };

    Ok(success_with_status(
        status,
        message,
        AuthResponse {
            user: UserSummary::from(&outcome.account),
            tokens: outcome.tokens,
        },
    ))
}

/// Also served at `/api/v1/auth/signin`.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
    )
)]
pub async fn login(
    req: web::Json<Value>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let body = expect_object(&req)?;
    let mut fields = Fields::new(body);
    let username = fields.required_str("username", USERNAME_MAX_LEN);
    let password = fields
        .optional_str("password", None)
        .map(|p| p.trim().to_string());
    fields.finish()?;
    let username = username.unwrap_or_default().trim().to_string();

    info!("Received login request for username: {}", username);
    match state.auth_service.login(&username, password.as_deref()).await {
        Ok((account, tokens)) => {
            info!("Login successful for username: {}", username);
            Ok(success(
                "Login successful",
                AuthResponse {
                    user: UserSummary::from(&account),
                    tokens,
                },
            ))
        }
        Err(e) => {
            warn!("Login failed for username: {}: {}", username, e);
            Err(e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current account", body = ApiResponse<MeResponse>),
        (status = 401, description = "Missing or invalid access token", body = ErrorBody),
    )
)]
pub async fn me(account: AuthenticatedAccount) -> HttpResponse {
    success(
        "User info retrieved",
        MeResponse {
            user: UserSummary::from(&*account),
        },
    )
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/token/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = ApiResponse<RefreshResponse>),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 401, description = "Invalid or expired refresh token", body = ErrorBody),
    )
)]
pub async fn refresh(
    req: web::Json<Value>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let body = expect_object(&req)?;
    let mut fields = Fields::new(body);
    let refresh_token = fields.required_str("refresh", usize::MAX);
    fields.finish()?;

    let access = state
        .auth_service
        .refresh_access_token(&refresh_token.unwrap_or_default())
        .await?;
    Ok(success("Token refreshed", RefreshResponse { access }))
}
