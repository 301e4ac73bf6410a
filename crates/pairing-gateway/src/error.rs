//! Error types for the gateway.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::api::PairResponse;
use crate::number::EXAMPLE_NUMBER;

/// Gateway error types.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Missing phone number")]
    MissingNumber,

    #[error("Invalid phone number. Provide full international number, e.g. {EXAMPLE_NUMBER}")]
    InvalidNumber,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Too many requests")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::MissingNumber | GatewayError::InvalidNumber => StatusCode::BAD_REQUEST,
            GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Storage(_)
            | GatewayError::Connection(_)
            | GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Every reply, success or failure, carries the same one-field body.
        let body = PairResponse {
            code: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(e: std::io::Error) -> Self {
        GatewayError::Storage(e.to_string())
    }
}

impl From<mdproto_client::ClientError> for GatewayError {
    fn from(e: mdproto_client::ClientError) -> Self {
        GatewayError::Connection(e.to_string())
    }
}
