use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::auth::AuthenticatedAccount;
use crate::db::models::{Account, Profile, ProfileChanges};
use crate::error::{AppError, ErrorBody};
use crate::response::{success, ApiResponse};
use crate::validation::{expect_object, FieldErrors, Fields, PHONE_MAX_LEN, UNKNOWN_FIELD};
use crate::AppState;

/// Fields that appear in the profile view but cannot be written through it.
const READ_ONLY_FIELDS: &[&str] = &[
    "id",
    "username",
    "email",
    "first_name",
    "last_name",
    "created_at",
    "updated_at",
];
const WRITABLE_FIELDS: &[&str] = &["phone_number", "bio"];

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileView {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileView {
    pub fn new(account: &Account, profile: Profile) -> Self {
        Self {
            id: profile.id,
            username: account.username.clone(),
            email: account.email.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            phone_number: profile.phone_number,
            bio: profile.bio,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

/// Partial profile update. Omitted fields are untouched and `null` clears one.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProfileUpdateRequest {
    #[schema(max_length = 20)]
    pub phone_number: Option<String>,
    pub bio: Option<String>,
}

/// Reads a partial update. Read-only fields are ignored, unknown ones rejected.
pub fn parse_profile_changes(body: &Map<String, Value>) -> Result<ProfileChanges, FieldErrors> {
    let mut fields = Fields::new(body);
    for key in body.keys() {
        if !WRITABLE_FIELDS.contains(&key.as_str()) && !READ_ONLY_FIELDS.contains(&key.as_str()) {
            fields.add_error(key, UNKNOWN_FIELD);
        }
    }

    let mut changes = ProfileChanges::default();
    if fields.contains("phone_number") {
        let value = fields.optional_str("phone_number", Some(PHONE_MAX_LEN));
        if !fields.has_error("phone_number") {
            changes.phone_number = Some(value);
        }
    }
    if fields.contains("bio") {
        let value = fields.optional_str("bio", None);
        if !fields.has_error("bio") {
            changes.bio = Some(value);
        }
    }

    fields.finish()?;
    Ok(changes)
}

#[utoipa::path(
    get,
    path = "/api/v1/profile/me",
    tag = "profile",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile of the current account, created if missing", body = ApiResponse<ProfileView>),
        (status = 401, description = "Missing or invalid access token", body = ErrorBody),
    )
)]
pub async fn get_profile(
    account: AuthenticatedAccount,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let profile = state.db.get_or_create_profile(account.id, None).await?;
    Ok(success("Profile retrieved", ProfileView::new(&account, profile)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/profile/me",
    tag = "profile",
    security(("bearer_auth" = [])),
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated profile", body = ApiResponse<ProfileView>),
        (status = 400, description = "Invalid or unknown fields", body = ErrorBody),
        (status = 401, description = "Missing or invalid access token", body = ErrorBody),
    )
)]
pub async fn update_profile(
    account: AuthenticatedAccount,
    req: web::Json<Value>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let profile = state.db.get_or_create_profile(account.id, None).await?;

    let body = expect_object(&req)?;
    let changes = parse_profile_changes(body).map_err(|errors| {
        warn!("Profile update for {} rejected: {}", account.username, errors);
        AppError::ValidationError(errors)
    })?;

    let profile = if changes.is_empty() {
        profile
    } else {
        state.db.update_profile(account.id, &changes).await?
    };
    info!("Profile updated for {}", account.username);

    Ok(success("Profile updated", ProfileView::new(&account, profile)))
}
