//! Gmail OAuth2 authentication
//!
//! Implements the web-server authorization code flow: the frontend sends
//! the user to [`GmailAuth::authorization_url`], Google redirects back with
//! a code, and the code is exchanged for tokens that are kept per user in a
//! [`TokenStore`]. Uses synchronous HTTP (ureq) to be executor-agnostic.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::token_store::{StoredToken, TokenStore};
use crate::config::GmailCredentials;
use crate::error::AuthenticationError;

/// Something that can produce a bearer token for Gmail API calls
pub trait TokenSource: Send + Sync {
    fn access_token(&self) -> Result<String>;
}

/// An access token supplied by the caller, used as-is
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenSource for BearerToken {
    fn access_token(&self) -> Result<String> {
        if self.0.is_empty() {
            return Err(AuthenticationError("Empty access token".to_string()).into());
        }
        Ok(self.0.clone())
    }
}

/// The stored token of one user, refreshed when close to expiry
pub struct StoredCredential {
    auth: Arc<GmailAuth>,
    email: String,
}

impl StoredCredential {
    pub fn new(auth: Arc<GmailAuth>, email: impl Into<String>) -> Self {
        Self {
            auth,
            email: email.into(),
        }
    }
}

impl TokenSource for StoredCredential {
    fn access_token(&self) -> Result<String> {
        self.auth.valid_access_token(&self.email)
    }
}

/// Token response from Google
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds
    pub expires_in: Option<u64>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl TokenGrant {
    /// Convert to the persisted form, anchoring the expiry at `now`
    pub fn to_stored(&self, now: i64) -> StoredToken {
        StoredToken {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expires_at: self.expires_in.map(|secs| now + secs as i64),
        }
    }
}

/// OAuth2 configuration and token management for Gmail
pub struct GmailAuth {
    client_id: String,
    client_secret: String,
    store: Arc<TokenStore>,
}

impl GmailAuth {
    /// Gmail API OAuth2 endpoints
    const AUTH_URL: &'static str = "https://accounts.google.com/o/oauth2/v2/auth";
    const TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";

    /// Read mail, save drafts
    const SCOPES: &'static [&'static str] = &[
        "https://www.googleapis.com/auth/gmail.readonly",
        "https://www.googleapis.com/auth/gmail.modify",
        "https://www.googleapis.com/auth/gmail.compose",
    ];

    pub fn new(credentials: GmailCredentials, store: Arc<TokenStore>) -> Self {
        Self {
            client_id: credentials.client_id,
            client_secret: credentials.client_secret,
            store,
        }
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Build the Google consent URL the user is sent to
    pub fn authorization_url(&self, redirect_uri: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent&include_granted_scopes=true",
            Self::AUTH_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&Self::SCOPES.join(" ")),
        )
    }

    /// Exchange an authorization code for tokens
    pub fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenGrant> {
        info!("Exchanging authorization code for tokens");
        let mut response = ureq::post(Self::TOKEN_URL)
            .send_form([
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri),
            ])
            .map_err(|e| token_endpoint_error(e, "Authorization code was rejected"))?;

        response
            .body_mut()
            .read_json()
            .context("Failed to parse token response")
    }

    /// Refresh an access token using a refresh token
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        debug!("Refreshing access token");
        let mut response = ureq::post(Self::TOKEN_URL)
            .send_form([
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .map_err(|e| token_endpoint_error(e, "Refresh token was rejected"))?;

        let mut grant: TokenGrant = response
            .body_mut()
            .read_json()
            .context("Failed to parse refresh token response")?;

        // Preserve the refresh token if not returned
        if grant.refresh_token.is_none() {
            grant.refresh_token = Some(refresh_token.to_string());
        }

        Ok(grant)
    }

    /// Store a grant for `email`, keeping a previously stored refresh token
    /// when Google didn't issue a new one
    pub fn remember(&self, email: &str, grant: &TokenGrant) -> Result<()> {
        let mut stored = grant.to_stored(chrono::Utc::now().timestamp());
        if stored.refresh_token.is_none() {
            stored.refresh_token = self.store.get(email).and_then(|t| t.refresh_token);
        }
        self.store.put(email, stored)
    }

    /// Drop the stored tokens for `email`
    pub fn forget(&self, email: &str) -> Result<bool> {
        self.store.remove(email)
    }

    /// Get a valid access token for `email`, refreshing it if needed
    pub fn valid_access_token(&self, email: &str) -> Result<String> {
        let token = self.store.get(email).ok_or_else(|| {
            AuthenticationError(format!("No stored credential for {}", email))
        })?;

        if token.is_fresh(chrono::Utc::now().timestamp()) {
            return Ok(token.access_token);
        }

        let Some(refresh_token) = token.refresh_token else {
            return Err(AuthenticationError(format!(
                "Stored credential for {} expired and cannot be refreshed",
                email
            ))
            .into());
        };

        let grant = self.refresh(&refresh_token)?;
        self.remember(email, &grant)?;
        Ok(grant.access_token)
    }
}

/// Client errors from the token endpoint mean the grant is unusable
fn token_endpoint_error(err: ureq::Error, rejected: &str) -> anyhow::Error {
    match err {
        ureq::Error::StatusCode(status @ (400 | 401)) => {
            warn!("Token endpoint returned {}", status);
            AuthenticationError(rejected.to_string()).into()
        }
        other => anyhow::anyhow!("Token request failed: {}", other),
    }
}
