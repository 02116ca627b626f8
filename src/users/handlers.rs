use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::Value;
use tracing::instrument;

use super::{
    dto::{changes_from_payload, lookup_from_payload, ChangePasswordRequest, UserData},
    services,
};
use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    response::{ApiResponse, Empty},
    state::AppState,
    validation::rules,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/search-user", post(search_user))
        .route("/change-password", post(change_password))
        .route("/current-user", get(current_user))
        .route("/update-account", patch(update_account))
}

// Body rules run before the session is resolved on the routes below, so a
// malformed request is rejected with 422 whether or not it carries a token.

#[instrument(skip(state, headers, body))]
pub async fn search_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<ApiResponse<UserData>, AppError> {
    let payload = rules::SEARCH.validate(body)?;
    AuthUser::from_headers(&state, &headers).await?;
    let user = services::search(state.store.as_ref(), &lookup_from_payload(&payload)).await?;
    Ok(ApiResponse::ok(UserData { user }, "user found"))
}

#[instrument(skip(state, headers, body))]
pub async fn change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<ApiResponse<Empty>, AppError> {
    let payload = rules::CHANGE_PASSWORD.validate(body)?;
    let AuthUser(user) = AuthUser::from_headers(&state, &headers).await?;
    services::change_password(
        state.store.as_ref(),
        user.id,
        ChangePasswordRequest::from_payload(&payload),
    )
    .await?;
    Ok(ApiResponse::ok(Empty::default(), "password changed successfully"))
}

#[instrument(skip(user))]
pub async fn current_user(AuthUser(user): AuthUser) -> ApiResponse<UserData> {
    ApiResponse::ok(UserData { user }, "current user fetched successfully")
}

#[instrument(skip(state, headers, body))]
pub async fn update_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<ApiResponse<UserData>, AppError> {
    let payload = rules::UPDATE_PROFILE.validate(body)?;
    let AuthUser(user) = AuthUser::from_headers(&state, &headers).await?;
    let user =
        services::update_profile(state.store.as_ref(), user.id, &changes_from_payload(&payload))
            .await?;
    Ok(ApiResponse::ok(UserData { user }, "details updated"))
}
