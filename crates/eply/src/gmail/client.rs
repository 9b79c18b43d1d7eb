//! Gmail API HTTP client
//!
//! Lists, fetches and drafts messages for one user. Uses synchronous HTTP
//! (ureq) to be executor-agnostic.

use anyhow::{Context, Result};
use base64::prelude::*;
use log::{debug, info};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use super::api::{DraftResponse, GmailMessage, ListMessagesResponse, ProfileResponse};
use super::auth::TokenSource;
use super::normalize::normalize_message;
use crate::error::{AuthenticationError, MessageNotFoundError};
use crate::mailbox::{MailFilter, Mailbox, MessagePage};
use crate::models::{DraftId, Email, EmailId};

/// Search query for received mail
const INBOX_QUERY: &str = "-in:sent -in:draft -in:chats";

/// Gmail caps page sizes at 500
const MAX_PAGE_SIZE: u32 = 500;

/// Gmail API client for one authenticated user
pub struct GmailClient {
    tokens: Arc<dyn TokenSource>,
}

impl GmailClient {
    /// Gmail API base URL
    const BASE_URL: &'static str = "https://gmail.googleapis.com/gmail/v1";

    /// Create a new Gmail client
    pub fn new(tokens: Arc<dyn TokenSource>) -> Self {
        Self { tokens }
    }

    /// Fetch the authenticated user's profile (address and totals)
    pub fn get_profile(&self) -> Result<ProfileResponse> {
        let url = format!("{}/users/me/profile", Self::BASE_URL);
        self.get_json(&url, "fetch the mailbox profile", None)
    }

    fn bearer(&self) -> Result<String> {
        Ok(format!("Bearer {}", self.tokens.access_token()?))
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        action: &str,
        message_id: Option<&EmailId>,
    ) -> Result<T> {
        let mut response = ureq::get(url)
            .header("Authorization", &self.bearer()?)
            .call()
            .map_err(|e| api_error(e, action, message_id))?;

        response
            .body_mut()
            .read_json()
            .with_context(|| format!("Failed to parse response to {}", action))
    }
}

impl Mailbox for GmailClient {
    fn list_messages(
        &self,
        filter: MailFilter,
        page_token: Option<&str>,
        max_results: u32,
    ) -> Result<MessagePage> {
        let url = list_url(filter, page_token, max_results);
        debug!("Listing {:?} messages", filter);

        let list: ListMessagesResponse = self.get_json(&url, "list messages", None)?;

        Ok(MessagePage {
            ids: list
                .messages
                .unwrap_or_default()
                .into_iter()
                .map(|m| EmailId::new(m.id))
                .collect(),
            next_page_token: list.next_page_token,
        })
    }

    fn get_message(&self, id: &EmailId) -> Result<Email> {
        let url = format!(
            "{}/users/me/messages/{}?format=full",
            Self::BASE_URL,
            urlencoding::encode(id.as_str())
        );

        let message: GmailMessage = self.get_json(&url, "fetch message", Some(id))?;
        normalize_message(message).with_context(|| format!("Failed to normalize message {}", id))
    }

    fn create_draft(&self, to: &str, subject: &str, body_text: &str) -> Result<DraftId> {
        let url = format!("{}/users/me/drafts", Self::BASE_URL);
        let raw = build_raw_message(to, subject, body_text);

        let mut response = ureq::post(&url)
            .header("Authorization", &self.bearer()?)
            .send_json(&serde_json::json!({ "message": { "raw": raw } }))
            .map_err(|e| api_error(e, "create draft", None))?;

        let draft: DraftResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse create draft response")?;

        info!("Created draft {}", draft.id);
        Ok(DraftId::new(draft.id))
    }
}

fn list_url(filter: MailFilter, page_token: Option<&str>, max_results: u32) -> String {
    let mut url = format!(
        "{}/users/me/messages?maxResults={}",
        GmailClient::BASE_URL,
        max_results.clamp(1, MAX_PAGE_SIZE)
    );

    match filter {
        MailFilter::Inbox => {
            url.push_str(&format!("&q={}", urlencoding::encode(INBOX_QUERY)));
        }
        MailFilter::Sent => url.push_str("&labelIds=SENT"),
    }

    if let Some(token) = page_token.filter(|t| !t.is_empty()) {
        url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
    }

    url
}

/// Map HTTP failures to the typed errors callers classify on
fn api_error(err: ureq::Error, action: &str, message_id: Option<&EmailId>) -> anyhow::Error {
    match (err, message_id) {
        (ureq::Error::StatusCode(status @ (401 | 403)), _) => AuthenticationError(format!(
            "Gmail returned {} while trying to {}",
            status, action
        ))
        .into(),
        (ureq::Error::StatusCode(404), Some(id)) => MessageNotFoundError(id.to_string()).into(),
        (other, _) => anyhow::anyhow!("Failed to {}: {}", action, other),
    }
}

/// Build a base64url-encoded RFC 2822 plain-text message for the drafts API
pub fn build_raw_message(to: &str, subject: &str, body_text: &str) -> String {
    let body = body_text.replace("\r\n", "\n").replace('\n', "\r\n");

    let message = format!(
        "To: {}\r\n\
         Subject: {}\r\n\
         MIME-Version: 1.0\r\n\
         Content-Type: text/plain; charset=\"UTF-8\"\r\n\
         Content-Transfer-Encoding: 8bit\r\n\
         \r\n\
         {}",
        single_line(to),
        encode_header_value(&single_line(subject)),
        body
    );

    BASE64_URL_SAFE.encode(message.as_bytes())
}

fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

/// RFC 2047 encoded-word for non-ASCII header values
fn encode_header_value(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", BASE64_STANDARD.encode(value.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(raw: &str) -> String {
        String::from_utf8(BASE64_URL_SAFE.decode(raw).unwrap()).unwrap()
    }

    #[test]
    fn test_list_url_inbox() {
        let url = list_url(MailFilter::Inbox, None, 20);
        assert_eq!(
            url,
            "https://gmail.googleapis.com/gmail/v1/users/me/messages?maxResults=20&q=-in%3Asent%20-in%3Adraft%20-in%3Achats"
        );
    }

    #[test]
    fn test_list_url_sent_with_page_token() {
        let url = list_url(MailFilter::Sent, Some("abc/123"), 30);
        assert!(url.contains("maxResults=30&labelIds=SENT"));
        assert!(url.ends_with("&pageToken=abc%2F123"));
    }

    #[test]
    fn test_list_url_clamps_page_size() {
        assert!(list_url(MailFilter::Sent, None, 5000).contains("maxResults=500"));
        assert!(list_url(MailFilter::Sent, None, 0).contains("maxResults=1&"));
        assert!(!list_url(MailFilter::Sent, Some(""), 10).contains("pageToken"));
    }

    #[test]
    fn test_build_raw_message() {
        let raw = build_raw_message("Frank <frank@uh.be>", "Re: Poster", "Beste Frank,\n\nGroeten,");
        let message = decode(&raw);

        assert!(message.starts_with("To: Frank <frank@uh.be>\r\nSubject: Re: Poster\r\n"));
        assert!(message.contains("Content-Type: text/plain; charset=\"UTF-8\"\r\n"));
        assert!(message.ends_with("\r\n\r\nBeste Frank,\r\n\r\nGroeten,"));
        assert!(!raw.contains('+') && !raw.contains('/'));
    }

    #[test]
    fn test_build_raw_message_encodes_non_ascii_subject() {
        let message = decode(&build_raw_message("a@b.c", "Re: Café", "ok"));
        assert!(message.contains("Subject: =?UTF-8?B?UmU6IENhZsOp?=\r\n"));
    }

    #[test]
    fn test_header_injection_is_flattened() {
        let message = decode(&build_raw_message("a@b.c\r\nBcc: x@y.z", "hi", "ok"));
        assert!(message.starts_with("To: a@b.c  Bcc: x@y.z\r\n"));
    }

    #[test]
    fn test_api_error_classification() {
        let id = EmailId::new("m1");
        let err = api_error(ureq::Error::StatusCode(401), "fetch message", Some(&id));
        assert!(err.downcast_ref::<AuthenticationError>().is_some());

        let err = api_error(ureq::Error::StatusCode(404), "fetch message", Some(&id));
        assert!(err.downcast_ref::<MessageNotFoundError>().is_some());

        let err = api_error(ureq::Error::StatusCode(404), "list messages", None);
        assert!(err.downcast_ref::<MessageNotFoundError>().is_none());

        let err = api_error(ureq::Error::StatusCode(500), "create draft", None);
        assert!(err.to_string().contains("create draft"));
    }
}
