//! JSON envelope and error mapping for handlers.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use webcode_core::error::WebCodeError;

/// `{ "success": true, "data": ... }`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data,
    })
}

pub type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

/// Handler error rendered as `{ "success": false, "message": ... }`.
///
/// Validation, not-found and remote Git errors keep their message. Everything
/// else is logged and answered with a generic 500.
#[derive(Debug)]
pub struct ApiError(pub WebCodeError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            WebCodeError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            WebCodeError::NotFound { .. } => StatusCode::NOT_FOUND,
            WebCodeError::Git(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<WebCodeError> for ApiError {
    fn from(err: WebCodeError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("[Api] Request failed: {}", self.0);
            "operation failed".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError(WebCodeError::invalid_argument("x")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(WebCodeError::not_found("session", "s1")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError(WebCodeError::operation_failed("failed", "disk I/O error")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
