//! Gmail API response normalization
//!
//! Converts Gmail API messages to [`Email`]s with a plain-text body.

use anyhow::{Context, Result};
use base64::prelude::*;

use super::api::{GmailMessage, MessagePart, MessagePayload};
use crate::models::Email;
use crate::text::{decode_html_entities, html_to_text};

/// Normalize a Gmail API message to an [`Email`]
pub fn normalize_message(gmail_msg: GmailMessage) -> Result<Email> {
    let payload = gmail_msg
        .payload
        .as_ref()
        .context("Message has no payload")?;

    let from = extract_header(payload, "From").unwrap_or_default();
    let subject = extract_header(payload, "Subject").unwrap_or_default();
    let date = extract_header(payload, "Date").unwrap_or_default();

    let html_body = find_body(payload, "text/html");
    let body = find_body(payload, "text/plain")
        .or_else(|| html_body.as_deref().map(html_to_text))
        .or_else(|| single_part_body(payload))
        .unwrap_or_default();

    Ok(Email::builder(gmail_msg.id.as_str())
        .from(from)
        .subject(subject)
        .date(date)
        .body(body)
        .html_body(html_body)
        .snippet(decode_html_entities(&gmail_msg.snippet))
        .build())
}

/// Extract a header value by name
fn extract_header(payload: &MessagePayload, name: &str) -> Option<String> {
    payload.headers.as_ref()?.iter().find_map(|h| {
        if h.name.eq_ignore_ascii_case(name) {
            Some(h.value.clone())
        } else {
            None
        }
    })
}

/// First body of the given MIME type, top-level first then depth-first
fn find_body(payload: &MessagePayload, mime: &str) -> Option<String> {
    if is_mime(payload.mime_type.as_deref(), mime)
        && let Some(body) = &payload.body
        && let Some(data) = &body.data
        && let Some(text) = decode_base64_body(data)
    {
        return Some(text);
    }

    find_in_parts(payload.parts.as_deref()?, mime)
}

fn find_in_parts(parts: &[MessagePart], mime: &str) -> Option<String> {
    for part in parts {
        if is_mime(part.mime_type.as_deref(), mime)
            && let Some(body) = &part.body
            && let Some(data) = &body.data
            && let Some(text) = decode_base64_body(data)
        {
            return Some(text);
        }

        if let Some(nested) = &part.parts
            && let Some(text) = find_in_parts(nested, mime)
        {
            return Some(text);
        }
    }

    None
}

/// Body data of a message with no recognised text part
fn single_part_body(payload: &MessagePayload) -> Option<String> {
    let data = payload.body.as_ref()?.data.as_ref()?;
    decode_base64_body(data)
}

fn is_mime(actual: Option<&str>, expected: &str) -> bool {
    actual.is_some_and(|m| m.to_ascii_lowercase().starts_with(expected))
}

/// Decode base64-encoded body data
///
/// Gmail uses URL-safe base64 but padding can vary, so we try multiple decoders.
fn decode_base64_body(data: &str) -> Option<String> {
    let decoders: &[&base64::engine::GeneralPurpose] = &[
        &BASE64_URL_SAFE_NO_PAD,
        &BASE64_URL_SAFE,
        &BASE64_STANDARD,
        &BASE64_STANDARD_NO_PAD,
    ];

    decoders
        .iter()
        .filter_map(|decoder| decoder.decode(data).ok())
        .find_map(|decoded| String::from_utf8(decoded).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gmail::api::{Header, MessageBody};

    fn encode(text: &str) -> String {
        BASE64_URL_SAFE_NO_PAD.encode(text)
    }

    fn headers(pairs: &[(&str, &str)]) -> Option<Vec<Header>> {
        Some(
            pairs
                .iter()
                .map(|(n, v)| Header {
                    name: n.to_string(),
                    value: v.to_string(),
                })
                .collect(),
        )
    }

    fn part(mime: &str, text: &str) -> MessagePart {
        MessagePart {
            mime_type: Some(mime.to_string()),
            body: Some(MessageBody {
                size: Some(text.len() as u32),
                data: Some(encode(text)),
            }),
            parts: None,
        }
    }

    fn message(payload: MessagePayload) -> GmailMessage {
        GmailMessage {
            id: "m1".to_string(),
            snippet: "Fish &amp; chips &lt;3".to_string(),
            payload: Some(payload),
        }
    }

    #[test]
    fn test_plain_single_part() {
        let payload = MessagePayload {
            headers: headers(&[
                ("FROM", "Frank <frank@uh.be>"),
                ("subject", "Poster"),
                ("Date", "Mon, 3 Mar 2025 10:00:00 +0100"),
            ]),
            body: Some(MessageBody {
                size: None,
                data: Some(encode("Dag Matthias,\n\nBezorg je je poster?")),
            }),
            parts: None,
            mime_type: Some("text/plain".to_string()),
        };

        let email = normalize_message(message(payload)).unwrap();
        assert_eq!(email.id.as_str(), "m1");
        assert_eq!(email.from, "Frank <frank@uh.be>");
        assert_eq!(email.subject, "Poster");
        assert_eq!(email.date, "Mon, 3 Mar 2025 10:00:00 +0100");
        assert_eq!(email.body, "Dag Matthias,\n\nBezorg je je poster?");
        assert_eq!(email.html_body, None);
        assert_eq!(email.snippet, "Fish & chips <3");
    }

    #[test]
    fn test_multipart_prefers_plain_text() {
        let payload = MessagePayload {
            headers: headers(&[("From", "a@b.c")]),
            body: None,
            parts: Some(vec![
                part("text/html", "<p>Hello <b>there</b></p>"),
                part("text/plain", "Hello there"),
            ]),
            mime_type: Some("multipart/alternative".to_string()),
        };

        let email = normalize_message(message(payload)).unwrap();
        assert_eq!(email.body, "Hello there");
        assert_eq!(email.html_body.as_deref(), Some("<p>Hello <b>there</b></p>"));
    }

    #[test]
    fn test_html_only_is_converted_to_text() {
        let nested = MessagePart {
            mime_type: Some("multipart/alternative".to_string()),
            body: None,
            parts: Some(vec![part("text/html", "<div>Hi Jan,<br>See you &amp; bye</div>")]),
        };
        let payload = MessagePayload {
            headers: None,
            body: None,
            parts: Some(vec![nested]),
            mime_type: Some("multipart/mixed".to_string()),
        };

        let email = normalize_message(message(payload)).unwrap();
        let lines: Vec<&str> = email.body.lines().map(str::trim).collect();
        assert!(lines.contains(&"Hi Jan,"));
        assert!(lines.contains(&"See you & bye"));
        assert!(email.html_body.is_some());
        assert_eq!(email.from, "");
    }

    #[test]
    fn test_missing_payload_is_error() {
        let msg = GmailMessage {
            id: "m1".to_string(),
            snippet: String::new(),
            payload: None,
        };
        assert!(normalize_message(msg).is_err());
    }

    #[test]
    fn test_decode_base64_body_with_and_without_padding() {
        assert_eq!(decode_base64_body("SGVsbG8sIFdvcmxkIQ"), Some("Hello, World!".to_string()));
        assert_eq!(decode_base64_body("SGVsbG8sIFdvcmxkIQ=="), Some("Hello, World!".to_string()));
        assert_eq!(decode_base64_body("%%%"), None);
    }
}
