//! API error handling
//!
//! Every failure leaves the server as `{"error": "<message>"}` with a
//! status code derived from the core error taxonomy.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use eply::{AuthenticationError, DraftError, MessageNotFoundError};
use log::{error, warn};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// A mailbox or completion provider failed
    #[error("{0}")]
    BadGateway(String),

    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Classify a mailbox or auth failure from the core
    pub fn from_provider(err: anyhow::Error) -> Self {
        if let Some(auth) = err.downcast_ref::<AuthenticationError>() {
            return Self::Unauthorized(auth.to_string());
        }
        if let Some(missing) = err.downcast_ref::<MessageNotFoundError>() {
            return Self::NotFound(missing.to_string());
        }
        Self::BadGateway(format!("{:#}", err))
    }
}

impl From<DraftError> for ApiError {
    fn from(err: DraftError) -> Self {
        let message = err.to_string();
        match err {
            DraftError::Authentication(_) => Self::Unauthorized(message),
            DraftError::NotFound(_) => Self::NotFound(message),
            DraftError::Provider { .. } => Self::BadGateway(message),
            DraftError::GenerationFailed => Self::Internal(message),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed ({}): {}", status, self);
        } else {
            warn!("Request rejected ({}): {}", status, self);
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
