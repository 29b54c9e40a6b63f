use std::time::Duration;

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::flow::state::FlowError;
use crate::redirect::{RedirectPlan, HR_LOGIN_PATH};
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// HR-only route reached without the access flag. The client is sent to
    /// the HR login view after `redirect_after`.
    #[error("Unauthorized")]
    Unauthorized { redirect_after: Duration },

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Session cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Video search error: {0}")]
    Video(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized { redirect_after } => return unauthorized_response(*redirect_after),
            AppError::Flow(e @ FlowError::InvalidTransition { .. }) => {
                (StatusCode::CONFLICT, "INVALID_TRANSITION", e.to_string())
            }
            AppError::Flow(e @ FlowError::MissingPrerequisites { .. }) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "MISSING_PREREQUISITES",
                e.to_string(),
            ),
            AppError::Store(e) => {
                tracing::error!("Store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Cache(e) => {
                tracing::error!("Session cache error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SESSION_ERROR",
                    "A session storage error occurred".to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Video(msg) => {
                tracing::error!("Video search error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "VIDEO_ERROR",
                    "Video search is unavailable".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// Warning plus a delayed redirect to the HR login view.
fn unauthorized_response(redirect_after: Duration) -> Response {
    let plan = RedirectPlan::new(HR_LOGIN_PATH, redirect_after);
    tracing::warn!("HR-only view requested without HR access");

    let body = Json(json!({
        "error": {
            "code": "UNAUTHORIZED",
            "message": "HR access required. Redirecting to login."
        },
        "redirect_to": plan.redirect_to,
        "redirect_after_ms": plan.redirect_after_ms
    }));

    (
        StatusCode::UNAUTHORIZED,
        [(header::REFRESH, plan.refresh_header())],
        body,
    )
        .into_response()
}
