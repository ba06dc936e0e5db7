pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod openapi;
pub mod profiles;
pub mod response;
pub mod validation;

use std::sync::Arc;
use actix_web::{web, HttpResponse};

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::AuthService;
pub use db::{Account, DbOperations, Profile};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
#[utoipa::path(
    get,
    path = "/health",
    tag = "meta",
    responses((status = 200, description = "Server is up"))
)]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub db: DbOperations,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    pub async fn new(config: Settings) -> Result<Self> {
        let db = DbOperations::connect(&config.database).await?;
        let auth_service = AuthService::new(db.clone(), config.auth.clone());

        Ok(Self {
            config: Arc::new(config),
            db,
            auth_service: Arc::new(auth_service),
        })
    }

    pub async fn shutdown(&self) -> Result<()> {
        // Close database connections
        self.db.close().await;
        Ok(())
    }
}

/// JSON body extractor settings: malformed payloads use the error envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| AppError::from(err).into())
}

/// Route registration for the versioned API, its schema and the health check.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/health", web::get().to(health_check))
        .service(
            web::scope("/api/v1")
                .route("/schema", web::get().to(openapi::api_schema))
                .service(
                    web::scope("/auth")
                        .route("/signup", web::post().to(auth::handlers::signup))
                        .route("/login", web::post().to(auth::handlers::login))
                        .route("/signin", web::post().to(auth::handlers::login))
                        .route("/me", web::get().to(auth::handlers::me))
                        .route("/token/refresh", web::post().to(auth::handlers::refresh)),
                )
                .service(
                    web::scope("/profile")
                        .route("/me", web::get().to(profiles::handlers::get_profile))
                        .route("/me", web::patch().to(profiles::handlers::update_profile)),
                ),
        );
}
