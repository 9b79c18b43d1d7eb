//! Application state shared across handlers

use std::sync::Arc;

use eply::{AssistantOptions, Completion, GmailAuth};

use crate::error::ApiError;
use crate::settings::ServerConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// OAuth flow and token store; absent when no Google credentials are configured
    pub auth: Option<Arc<GmailAuth>>,
    /// Completion provider used for style analysis and replies
    pub completion: Arc<dyn Completion>,
    pub config: Arc<ServerConfig>,
    pub options: AssistantOptions,
}

impl AppState {
    pub fn auth(&self) -> Result<Arc<GmailAuth>, ApiError> {
        self.auth
            .clone()
            .ok_or_else(|| ApiError::Internal("No Google credentials available".to_string()))
    }
}
