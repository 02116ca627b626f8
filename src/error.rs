use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::users::store::StoreError;
use crate::validation::FieldError;

/// Every way an account operation can fail, as seen by the client.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    BadRequest(String),
    /// The cause is logged when the error is built and never sent out.
    #[error("server error")]
    Server,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Server => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    /// Logs `cause` with `context` and collapses it into a generic server error.
    pub fn internal(context: &str, cause: impl std::fmt::Display) -> Self {
        error!(error = %cause, "{context}");
        AppError::Server
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(field) => {
                warn!(field = field.as_str(), "unique constraint hit");
                AppError::Conflict("username or email already exists")
            }
            StoreError::Rejected(reason) => AppError::BadRequest(reason),
            StoreError::Backend(cause) => AppError::internal("store call failed", cause),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    status_code: u16,
    data: Option<()>,
    message: String,
    success: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<FieldError>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        let errors = match self {
            AppError::Validation(errors) => errors,
            _ => Vec::new(),
        };
        let body = ErrorBody {
            status_code: status.as_u16(),
            data: None,
            message,
            success: false,
            errors,
        };
        (status, Json(body)).into_response()
    }
}
