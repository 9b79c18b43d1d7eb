//! Per-user OAuth token persistence
//!
//! Tokens live in one JSON file mapping mailbox address to token record.
//! The whole map is held in memory and rewritten on every change.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Token filename in the Eply config directory
const TOKENS_FILE: &str = "gmail-tokens.json";

/// Tokens expiring within this many seconds are treated as expired
pub(crate) const EXPIRY_MARGIN_SECS: i64 = 300;

/// A user's OAuth tokens as persisted on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix timestamp (seconds) when the access token expires
    pub expires_at: Option<i64>,
}

impl StoredToken {
    /// Whether the access token is valid for at least the expiry margin
    pub fn is_fresh(&self, now: i64) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at > now + EXPIRY_MARGIN_SECS)
    }
}

/// Keyed token store backed by a JSON file
pub struct TokenStore {
    path: PathBuf,
    tokens: RwLock<HashMap<String, StoredToken>>,
}

impl TokenStore {
    /// Open the store at `path`, starting empty if the file doesn't exist
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let tokens = if path.exists() {
            config::load_json_file(&path)?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            tokens: RwLock::new(tokens),
        })
    }

    /// Open `gmail-tokens.json` in the Eply config directory
    pub fn open_default() -> Result<Self> {
        let path = config::config_path(TOKENS_FILE).context("Could not determine config directory")?;
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, email: &str) -> Option<StoredToken> {
        self.tokens.read().unwrap().get(&key(email)).cloned()
    }

    /// Insert or replace the token for `email` and persist the store
    pub fn put(&self, email: &str, token: StoredToken) -> Result<()> {
        let mut tokens = self.tokens.write().unwrap();
        tokens.insert(key(email), token);
        config::save_json_file(&self.path, &*tokens)
    }

    /// Remove the token for `email`; returns whether one was stored
    pub fn remove(&self, email: &str) -> Result<bool> {
        let mut tokens = self.tokens.write().unwrap();
        if tokens.remove(&key(email)).is_none() {
            return Ok(false);
        }
        config::save_json_file(&self.path, &*tokens)?;
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.tokens.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn key(email: &str) -> String {
    email.trim().to_lowercase()
}
