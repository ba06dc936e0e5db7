use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// When false, signup and login no longer require a valid password.
    pub enabled: bool,
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_hours: i64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allow_any_origin: bool,
    pub allowed_origins: Vec<String>,
    pub max_age: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
}

// Lowest cost bcrypt accepts.
const TEST_BCRYPT_COST: i64 = 4;

fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    builder
        .set_default("environment", "development")?
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("server.workers", num_cpus::get() as i64)?
        .set_default("database.url", "sqlite://account_server.db?mode=rwc")?
        .set_default("database.max_connections", 5)?
        .set_default("auth.enabled", true)?
        .set_default("auth.jwt_secret", "development_secret")?
        .set_default("auth.access_token_ttl_minutes", 5)?
        .set_default("auth.refresh_token_ttl_hours", 24)?
        .set_default("auth.bcrypt_cost", bcrypt::DEFAULT_COST as i64)?
        .set_default("cors.enabled", true)?
        .set_default("cors.allow_any_origin", false)?
        .set_default(
            "cors.allowed_origins",
            vec!["http://localhost:5173", "http://127.0.0.1:5173"],
        )?
        .set_default("cors.max_age", 3600)
}

fn environment_source() -> Environment {
    // E.g., `APP_AUTH__ENABLED=false` would set `Settings.auth.enabled`
    Environment::with_prefix("app")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("cors.allowed_origins")
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        with_defaults(Config::builder())?
            // Add in settings from the config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(environment_source())
            .build()?
            .try_deserialize()
    }

    /// Deterministic settings for tests: in-memory database, cheapest bcrypt
    /// cost, no file or environment sources.
    pub fn new_for_test() -> Result<Self, ConfigError> {
        with_defaults(Config::builder())?
            .set_override("environment", "test")?
            .set_override("database.url", "sqlite::memory:")?
            .set_override("database.max_connections", 1)?
            .set_override("auth.jwt_secret", "test_secret")?
            .set_override("auth.bcrypt_cost", TEST_BCRYPT_COST)?
            .build()?
            .try_deserialize()
    }
}
