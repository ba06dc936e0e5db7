use actix_web::web;
use tracing::{info, warn};

use crate::auth::tokens::{TokenIssuer, TokenKind, TokenPair};
use crate::config::AuthConfig;
use crate::db::models::{Account, NewAccount};
use crate::db::operations::DbOperations;
use crate::error::{AppError, AuthError, DatabaseError};
use crate::validation::FieldErrors;

pub const PASSWORD_REQUIRED: &str = "Password is required when Auth is enabled.";

/// Validated signup payload.
#[derive(Debug, Clone, Default)]
pub struct SignupInput {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug)]
pub struct SignupOutcome {
    pub account: Account,
    pub tokens: TokenPair,
    /// False when auth is disabled and the username already existed.
    pub created: bool,
}

pub struct AuthService {
    db: DbOperations,
    tokens: TokenIssuer,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(db: DbOperations, config: AuthConfig) -> Self {
        Self {
            tokens: TokenIssuer::new(&config),
            db,
            config,
        }
    }

    pub fn auth_enabled(&self) -> bool {
        self.config.enabled
    }

    pub async fn signup(&self, input: SignupInput) -> Result<SignupOutcome, AppError> {
        let mut new_account = NewAccount {
            username: input.username.clone(),
            password_hash: None,
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
        };

        let (account, created) = if self.config.enabled {
            let password = input
                .password
                .filter(|p| !p.trim().is_empty())
                .ok_or_else(|| {
                    FieldErrors::single("password", PASSWORD_REQUIRED)
                })?;

            if self.db.username_exists(&input.username).await? {
                warn!("Signup rejected, username already exists: {}", input.username);
                return Err(AppError::UsernameTaken);
            }

            new_account.password_hash = Some(self.hash_password(password).await?);
            let account = self.db.create_account(&new_account).await.map_err(|e| match e {
                // Lost a race with a concurrent signup for the same name.
                AppError::DatabaseError(DatabaseError::Duplicate) => AppError::UsernameTaken,
                other => other,
            })?;
            (account, true)
        } else {
            self.db.get_or_create_account(&new_account).await?
        };

        if let Some(phone) = input.phone_number.as_deref().filter(|p| !p.is_empty()) {
            self.db.get_or_create_profile(account.id, Some(phone)).await?;
        }

        let tokens = self.tokens.issue_pair(account.id)?;
        info!("Signup complete for {} (created: {})", account.username, created);

        Ok(SignupOutcome {
            account,
            tokens,
            created,
        })
    }

    pub async fn login(&self, username: &str, password: Option<&str>) -> Result<(Account, TokenPair), AppError> {
        let account = match self.authenticate(username, password).await? {
            Some(account) => account,
            None if !self.config.enabled => self
                .db
                .find_account_by_username(username)
                .await?
                .filter(|account| account.is_active)
                .ok_or(AuthError::InvalidCredentials)?,
            None => return Err(AuthError::InvalidCredentials.into()),
        };

        self.db.touch_last_login(account.id).await?;
        let tokens = self.tokens.issue_pair(account.id)?;
        Ok((account, tokens))
    }

    /// Password check against an active account with a usable password.
    pub async fn authenticate(&self, username: &str, password: Option<&str>) -> Result<Option<Account>, AppError> {
        let Some(password) = password.filter(|p| !p.trim().is_empty()) else {
            return Ok(None);
        };
        let Some(account) = self.db.find_account_by_username(username).await? else {
            return Ok(None);
        };
        let Some(hash) = account.password_hash.clone().filter(|_| account.is_active) else {
            return Ok(None);
        };

        let password = password.to_string();
        let matches = web::block(move || bcrypt::verify(password, &hash)).await?;
        match matches {
            Ok(true) => Ok(Some(account)),
            Ok(false) => Ok(None),
            Err(e) => {
                warn!("Stored password hash for {} is unreadable: {}", account.username, e);
                Ok(None)
            }
        }
    }

    /// Resolves a bearer access token to its active account.
    pub async fn account_for_access_token(&self, token: &str) -> Result<Account, AppError> {
        let claims = self.tokens.decode(token, TokenKind::Access)?;
        self.active_account(claims.account_id()?).await
    }

    /// Exchanges a refresh token for a fresh access token.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<String, AppError> {
        let claims = self.tokens.decode(refresh_token, TokenKind::Refresh)?;
        let account = self.active_account(claims.account_id()?).await?;
        self.tokens.issue(account.id, TokenKind::Access)
    }

    async fn active_account(&self, account_id: i64) -> Result<Account, AppError> {
        self.db
            .find_account_by_id(account_id)
            .await?
            .filter(|account| account.is_active)
            .ok_or_else(|| AuthError::InvalidToken.into())
    }

    async fn hash_password(&self, password: String) -> Result<String, AppError> {
        let cost = self.config.bcrypt_cost;
        let hash = web::block(move || bcrypt::hash(password, cost)).await??;
        Ok(hash)
    }
}
