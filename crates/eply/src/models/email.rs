//! Email model as fetched from the mailbox

use serde::{Deserialize, Serialize};

/// Unique identifier for an email (Gmail message ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailId(pub String);

impl EmailId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for EmailId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EmailId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for EmailId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An email address with optional display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
    /// Display name (e.g., "John Doe")
    pub name: Option<String>,
    /// Email address (e.g., "john@example.com")
    pub email: String,
}

impl EmailAddress {
    /// Create a new email address with just the email
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }

    /// Parse an email address from a header value like `"John Doe" <john@example.com>`
    ///
    /// The display name is everything before the first `<`, so a header
    /// whose closing `>` was cut off still yields its name.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();

        let Some((name, rest)) = s.split_once('<') else {
            return Self::new(s);
        };
        let name = name.trim().trim_matches('"').trim();
        let email = rest.split_once('>').map_or(rest, |(addr, _)| addr).trim();

        Self {
            name: (!name.is_empty()).then(|| name.to_string()),
            email: email.to_string(),
        }
    }

    /// Local part of the address (before the `@`), if the address has one
    pub fn local_part(&self) -> Option<&str> {
        self.email.split_once('@').map(|(local, _)| local)
    }
}

/// A single email, fetched on demand and never persisted locally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    /// Gmail message ID
    pub id: EmailId,
    /// Raw `From` header value
    pub from: String,
    /// Subject line
    pub subject: String,
    /// Raw `Date` header value
    pub date: String,
    /// Plain-text body
    pub body: String,
    /// Original HTML body, when the message carried one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_body: Option<String>,
    /// Short provider-generated preview
    pub snippet: String,
}

impl Email {
    /// Create a new email builder
    pub fn builder(id: impl Into<EmailId>) -> EmailBuilder {
        EmailBuilder::new(id.into())
    }

    /// Parsed sender address
    pub fn sender(&self) -> EmailAddress {
        EmailAddress::parse(&self.from)
    }
}

/// Builder for creating Email instances
pub struct EmailBuilder {
    id: EmailId,
    from: String,
    subject: String,
    date: String,
    body: String,
    html_body: Option<String>,
    snippet: String,
}

impl EmailBuilder {
    fn new(id: EmailId) -> Self {
        Self {
            id,
            from: String::new(),
            subject: String::new(),
            date: String::new(),
            body: String::new(),
            html_body: None,
            snippet: String::new(),
        }
    }

    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = from.into();
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn html_body(mut self, html_body: Option<String>) -> Self {
        self.html_body = html_body;
        self
    }

    pub fn snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn build(self) -> Email {
        Email {
            id: self.id,
            from: self.from,
            subject: self.subject,
            date: self.date,
            body: self.body,
            html_body: self.html_body,
            snippet: self.snippet,
        }
    }
}

/// Lightweight view of an email for list screens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailSummary {
    pub id: EmailId,
    pub from: String,
    pub subject: String,
    pub date: String,
    pub snippet: String,
}

impl From<Email> for EmailSummary {
    fn from(email: Email) -> Self {
        Self {
            id: email.id,
            from: email.from,
            subject: email.subject,
            date: email.date,
            snippet: email.snippet,
        }
    }
}
