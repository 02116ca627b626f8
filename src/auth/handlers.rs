use axum::{
    extract::{FromRef, State},
    http::{header, HeaderMap, HeaderValue},
    routing::post,
    Json, Router,
};
use serde_json::Value;
use tracing::{info, instrument};

use super::{
    dto::{registration_from_payload, LoginData, LoginRequest},
    extractors::AuthUser,
    jwt::JwtKeys,
    services,
    session::{cleared_session_cookie, session_cookie},
};
use crate::{
    error::AppError,
    response::{ApiResponse, Empty},
    state::AppState,
    users::repo_types::UserProfile,
    validation::rules,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

#[instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<ApiResponse<UserProfile>, AppError> {
    let payload = rules::REGISTRATION.validate(body)?;
    let user = registration_from_payload(&payload)?;
    let profile = services::register(state.store.as_ref(), user).await?;
    Ok(ApiResponse::created(profile, "user registered successfully"))
}

#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(HeaderMap, ApiResponse<LoginData>), AppError> {
    let payload = rules::LOGIN.validate(body)?;
    let keys = JwtKeys::from_ref(&state);
    let (user, access_token) =
        services::login(state.store.as_ref(), &keys, LoginRequest::from_payload(&payload)).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&session_cookie(&access_token))
            .map_err(|e| AppError::internal("session cookie", e))?,
    );

    Ok((
        headers,
        ApiResponse::ok(LoginData { user, access_token }, "user logged in"),
    ))
}

/// Clears the session cookie. The token itself stays valid until it expires.
#[instrument(skip(state, user))]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<(HeaderMap, ApiResponse<Empty>), AppError> {
    state.store.find_by_id(user.id).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cleared_session_cookie())
            .map_err(|e| AppError::internal("session cookie", e))?,
    );

    info!(user_id = %user.id, "user logged out");
    Ok((headers, ApiResponse::ok(Empty::default(), "user logged out")))
}
