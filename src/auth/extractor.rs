use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;

use crate::db::models::Account;
use crate::error::{AppError, AuthError};
use crate::AppState;

/// The account behind a valid `Authorization: Bearer <access token>` header.
///
/// Handlers taking this as an argument reject unauthenticated requests with 401.
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount(pub Account);

impl std::ops::Deref for AuthenticatedAccount {
    type Target = Account;

    fn deref(&self) -> &Account {
        &self.0
    }
}

pub fn bearer_token(req: &HttpRequest) -> Result<String, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::NotAuthenticated)?;

    header
        .to_str()
        .ok()
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AuthError::InvalidToken.into())
}

impl FromRequest for AuthenticatedAccount {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let state = state
                .ok_or_else(|| AppError::InternalError("application state is not registered".into()))?;
            let account = state.auth_service.account_for_access_token(&token?).await?;
            Ok(AuthenticatedAccount(account))
        })
    }
}
