//! JSON error responses.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use walletd_core::LedgerError;

/// Error returned by handlers.
#[derive(Debug)]
pub enum ApiError {
    /// A ledger operation failed.
    Ledger(LedgerError),
    /// The request body could not be decoded.
    Body(JsonRejection),
    /// A path parameter could not be decoded.
    Path(PathRejection),
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self::Ledger(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection)
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Path(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Ledger(err) => {
                let status = StatusCode::from_u16(err.http_status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                json_error(
                    status,
                    err.error_code(),
                    err.public_message(),
                    err.is_retryable(),
                )
            }
            // Syntax errors, empty bodies and a missing content type all count
            // as a malformed body.
            Self::Body(rejection) => json_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_REQUEST_BODY",
                rejection.body_text(),
                false,
            ),
            Self::Path(rejection) => json_error(
                StatusCode::BAD_REQUEST,
                "INVALID_WALLET_ID",
                rejection.body_text(),
                false,
            ),
        }
    }
}

/// Builds an error response with the standard body shape.
pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
    retryable: bool,
) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
            "retryable": retryable,
        })),
    )
        .into_response()
}
