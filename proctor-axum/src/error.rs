use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not_logged_in")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(&'static str),

    #[error("{0}")]
    Proctor(#[from] proctor::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({"ok": false, "msg": "not_logged_in"})),
            )
                .into_response(),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                Json(json!({"ok": false, "msg": msg})),
            )
                .into_response(),
            ApiError::Proctor(proctor::Error::InvalidInput(msg)) => (
                StatusCode::BAD_REQUEST,
                Json(json!({"ok": false, "msg": msg})),
            )
                .into_response(),
            ApiError::Proctor(proctor::Error::BothPathsFailed { primary, backup }) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"ok": false, "error": backup, "primary_error": primary})),
            )
                .into_response(),
            ApiError::Proctor(e) => {
                error!("{e}");

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"ok": false, "error": "internal server error"})),
                )
                    .into_response()
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
