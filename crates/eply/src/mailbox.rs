//! Mailbox capability
//!
//! Everything the drafting pipeline and the list endpoints need from a mail
//! provider. [`crate::gmail::GmailClient`] is the production implementation.

use anyhow::Result;

use crate::models::{DraftId, Email, EmailId};

/// Which messages a listing returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailFilter {
    /// Received mail, excluding sent items, drafts and chats
    Inbox,
    /// Mail the user sent
    Sent,
}

/// One page of message IDs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePage {
    pub ids: Vec<EmailId>,
    pub next_page_token: Option<String>,
}

/// A mail provider scoped to one authenticated user
///
/// Implementations raise [`crate::AuthenticationError`] when the credential
/// is rejected and [`crate::MessageNotFoundError`] for unknown message IDs.
pub trait Mailbox: Send + Sync {
    fn list_messages(
        &self,
        filter: MailFilter,
        page_token: Option<&str>,
        max_results: u32,
    ) -> Result<MessagePage>;

    fn get_message(&self, id: &EmailId) -> Result<Email>;

    /// Save a plain-text draft addressed to `to`
    fn create_draft(&self, to: &str, subject: &str, body_text: &str) -> Result<DraftId>;
}
