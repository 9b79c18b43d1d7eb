//! Error types surfaced by the drafting pipeline

use std::fmt;

/// The mailbox rejected the credential (HTTP 401/403) or none was available
#[derive(Debug, thiserror::Error)]
#[error("Mailbox authentication failed: {0}")]
pub struct AuthenticationError(pub String);

/// The mailbox has no message with the requested ID
#[derive(Debug, thiserror::Error)]
#[error("Message {0} not found")]
pub struct MessageNotFoundError(pub String);

/// Which external capability failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Mailbox,
    Completion,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mailbox => f.write_str("mailbox"),
            Self::Completion => f.write_str("completion"),
        }
    }
}

/// Request-level failures of the drafting pipeline
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Email {0} could not be retrieved")]
    NotFound(String),

    #[error("The {provider} provider failed: {message}")]
    Provider {
        provider: ProviderKind,
        message: String,
    },

    #[error("Failed to generate reply")]
    GenerationFailed,
}

impl DraftError {
    /// Classify a mailbox failure, recognising the typed errors the Gmail client raises
    pub fn from_mailbox(err: anyhow::Error) -> Self {
        if let Some(auth) = err.downcast_ref::<AuthenticationError>() {
            return Self::Authentication(auth.0.clone());
        }
        if let Some(missing) = err.downcast_ref::<MessageNotFoundError>() {
            return Self::NotFound(missing.0.clone());
        }
        Self::Provider {
            provider: ProviderKind::Mailbox,
            message: format!("{:#}", err),
        }
    }

    /// Wrap a completion provider failure
    pub fn from_completion(err: anyhow::Error) -> Self {
        Self::Provider {
            provider: ProviderKind::Completion,
            message: format!("{:#}", err),
        }
    }
}
