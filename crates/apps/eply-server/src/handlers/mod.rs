//! HTTP request handlers

pub mod auth;
pub mod emails;
pub mod health;
pub mod reply;

use std::sync::Arc;

use eply::{BearerToken, GmailClient};

use crate::error::ApiError;

/// Run synchronous core work on the blocking thread pool
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(format!("Request worker failed: {}", e)))?
}

/// Gmail client acting with the caller's access token
pub(crate) fn gmail_for(access_token: String) -> GmailClient {
    GmailClient::new(Arc::new(BearerToken::new(access_token)))
}
