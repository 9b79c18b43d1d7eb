//! Email query functions

use anyhow::Result;
use log::warn;
use serde::Serialize;

use crate::error::AuthenticationError;
use crate::mailbox::{MailFilter, Mailbox};
use crate::models::{Email, EmailId, EmailSummary};

/// One page of the inbox, ready for a list view
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxPage {
    pub emails: Vec<EmailSummary>,
    pub next_page_token: Option<String>,
}

/// List a page of received mail
///
/// Messages that fail to load are skipped.
///
/// # Arguments
/// * `mailbox` - The user's mailbox
/// * `page_token` - Token from a previous page, if any
/// * `max_results` - Maximum number of messages on the page
pub fn list_inbox(
    mailbox: &dyn Mailbox,
    page_token: Option<&str>,
    max_results: u32,
) -> Result<InboxPage> {
    let page = mailbox.list_messages(MailFilter::Inbox, page_token, max_results)?;
    let emails = fetch_messages(mailbox, &page.ids)?;

    Ok(InboxPage {
        emails: emails.into_iter().map(EmailSummary::from).collect(),
        next_page_token: page.next_page_token,
    })
}

/// List the most recent sent mail with full bodies
pub fn list_sent(mailbox: &dyn Mailbox, max_results: u32) -> Result<Vec<Email>> {
    let page = mailbox.list_messages(MailFilter::Sent, None, max_results)?;
    fetch_messages(mailbox, &page.ids)
}

/// Get a single email with its full body
pub fn get_email_detail(mailbox: &dyn Mailbox, id: &EmailId) -> Result<Email> {
    mailbox.get_message(id)
}

/// Fetch messages in order, skipping any that fail to load.
///
/// A rejected credential is not skippable and aborts the whole fetch.
pub fn fetch_messages(mailbox: &dyn Mailbox, ids: &[EmailId]) -> Result<Vec<Email>> {
    let mut emails = Vec::with_capacity(ids.len());

    for id in ids {
        match mailbox.get_message(id) {
            Ok(email) => emails.push(email),
            Err(e) if e.downcast_ref::<AuthenticationError>().is_some() => return Err(e),
            Err(e) => warn!("Skipping message {}: {:#}", id, e),
        }
    }

    Ok(emails)
}
