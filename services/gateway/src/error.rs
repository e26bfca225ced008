//! HTTP error mapping for the JSON API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use types::errors::EngineError;

/// Central error type for the gateway API.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("risk denied: {0}")]
    RiskDenied(String),

    #[error("trading halted: {0}")]
    Halted(String),

    #[error("queue full")]
    QueueFull,

    #[error("engine unavailable")]
    EngineUnavailable,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("timed out waiting for the engine")]
    Timeout,

    #[error("internal error")]
    Internal(String),
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(msg) => AppError::BadRequest(msg),
            EngineError::RiskDenied { reason, .. } => AppError::RiskDenied(reason),
            EngineError::Halted { reason } => AppError::Halted(reason),
            EngineError::QueueFull => AppError::QueueFull,
            EngineError::EngineNotRunning => AppError::EngineUnavailable,
            EngineError::DuplicateOrderId(id) => {
                AppError::BadRequest(format!("duplicate order id {id}"))
            }
            EngineError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::RiskDenied(msg) => (StatusCode::FORBIDDEN, "RISK_DENIED", msg),
            AppError::Halted(msg) => (StatusCode::SERVICE_UNAVAILABLE, "HALTED", msg),
            AppError::QueueFull => (
                StatusCode::TOO_MANY_REQUESTS,
                "QUEUE_FULL",
                "ingress queue full, retry".to_string(),
            ),
            AppError::EngineUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "ENGINE_UNAVAILABLE",
                "engine is not running".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::Timeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "TIMEOUT",
                "no response from the engine".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "internal error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": code,
            "message": message,
        }));
        (status, body).into_response()
    }
}
