//! HTTP error handling and response conversion.
//!
//! Every failure leaves the service as the same envelope, `{"error": "<message>"}`,
//! with the status code of its category. This is the only place where relay
//! failures are turned into HTTP statuses.

use crate::domain::qrcode::errors::RelayError;
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Application-level errors returned from handlers.
#[derive(Debug)]
pub enum AppError {
    /// Multipart body could not be read (400).
    BadRequest(String),

    /// Upload exceeded the configured body limit (413).
    PayloadTooLarge(String),

    /// Required form field absent (422).
    MissingField(&'static str),

    /// Upstream answered but refused the request (400).
    UpstreamRejected(String),

    /// Upstream answered with an unusable body (502).
    UpstreamMalformed(String),

    /// Upstream could not be reached (502).
    UpstreamUnavailable(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            Self::MissingField(name) => write!(f, "Missing field: {}", name),
            Self::UpstreamRejected(msg) => write!(f, "Upstream rejected: {}", msg),
            Self::UpstreamMalformed(msg) => write!(f, "Upstream malformed: {}", msg),
            Self::UpstreamUnavailable(msg) => write!(f, "Upstream unavailable: {}", msg),
        }
    }
}

impl AppError {
    /// Get the appropriate HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::UpstreamRejected(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::UpstreamMalformed(_) | Self::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message placed in the `error` field of the envelope.
    fn user_message(&self) -> String {
        match self {
            Self::BadRequest(msg)
            | Self::PayloadTooLarge(msg)
            | Self::UpstreamRejected(msg)
            | Self::UpstreamMalformed(msg)
            | Self::UpstreamUnavailable(msg) => msg.clone(),
            Self::MissingField(name) => format!("Missing {} field", name),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.user_message();

        if status.is_server_error() {
            tracing::error!("error={}", self);
        } else {
            tracing::warn!("error={}", self);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

// === Relay Error Conversion ===

impl From<RelayError> for AppError {
    fn from(err: RelayError) -> Self {
        let message = err.to_string();
        match err {
            RelayError::UpstreamRejected(_) => AppError::UpstreamRejected(message),
            RelayError::UpstreamMalformed { .. } => AppError::UpstreamMalformed(message),
            RelayError::TransportFailure { .. } => AppError::UpstreamUnavailable(message),
        }
    }
}

// === Multipart Error Conversion ===

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        tracing::warn!(multipart_error = %err);
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(err.body_text())
        } else {
            AppError::BadRequest(err.body_text())
        }
    }
}
