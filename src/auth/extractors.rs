use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};

use super::{jwt::JwtKeys, services::authenticate, session::token_from_headers};
use crate::{error::AppError, state::AppState, users::repo_types::UserProfile};

/// The authenticated caller, resolved from the session token on every request.
pub struct AuthUser(pub UserProfile);

impl AuthUser {
    /// Resolves the caller from request headers. Handlers that validate the
    /// body before authenticating call this directly.
    pub async fn from_headers(state: &AppState, headers: &HeaderMap) -> Result<Self, AppError> {
        let token = token_from_headers(headers);
        let keys = JwtKeys::from_ref(state);
        let user = authenticate(state.store.as_ref(), &keys, token.as_deref()).await?;
        Ok(AuthUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        AuthUser::from_headers(state, &parts.headers).await
    }
}
