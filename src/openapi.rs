//! OpenAPI document for the HTTP API, served at `/api/v1/schema`.

use actix_web::HttpResponse;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::auth::handlers::{
    AuthResponse, LoginRequest, MeResponse, RefreshRequest, RefreshResponse, SignupRequest,
    UserSummary,
};
use crate::auth::TokenPair;
use crate::error::ErrorBody;
use crate::profiles::handlers::{ProfileUpdateRequest, ProfileView};

#[derive(OpenApi)]
#[openapi(
    info(title = "Account server API"),
    paths(
        crate::health_check,
        crate::auth::handlers::signup,
        crate::auth::handlers::login,
        crate::auth::handlers::me,
        crate::auth::handlers::refresh,
        crate::profiles::handlers::get_profile,
        crate::profiles::handlers::update_profile,
        api_schema,
    ),
    components(schemas(
        SignupRequest,
        LoginRequest,
        RefreshRequest,
        ProfileUpdateRequest,
        UserSummary,
        TokenPair,
        AuthResponse,
        MeResponse,
        RefreshResponse,
        ProfileView,
        ErrorBody,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Signup, login and tokens"),
        (name = "profile", description = "Profile of the current account"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/schema",
    tag = "meta",
    responses((status = 200, description = "This OpenAPI document"))
)]
pub async fn api_schema() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}
