//! Transport-level API errors
//!
//! Protocol failures are answered with a signed `oadrResponse` and HTTP 200;
//! only failures that leave nothing to sign end up here.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use vtn_core::VtnError;

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to encode response: {0}")]
    ResponseEncoding(#[from] VtnError),
}

/// API error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, details) = match &self {
            ApiError::ResponseEncoding(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "RESPONSE_ENCODING_FAILED",
                Some(serde_json::json!({ "error_kind": err.kind() })),
            ),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_failure_is_500() {
        let err = ApiError::from(VtnError::SerializationError("cbor".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
