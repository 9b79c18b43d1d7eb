//! Server configuration
//!
//! Loaded from `server.json` in the Eply config directory when present,
//! then overridden by `HOST`, `PORT`, `REDIRECT_URI` and `ALLOWED_ORIGINS`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const SERVER_CONFIG_FILE: &str = "server.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// OAuth redirect URI used when a request doesn't supply one
    pub redirect_uri: String,
    /// CORS origins; empty allows any origin
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 10000,
            redirect_uri: "http://localhost:5173/oauth-callback".to_string(),
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        let base = if config::config_exists(SERVER_CONFIG_FILE) {
            config::load_json(SERVER_CONFIG_FILE)?
        } else {
            Self::default()
        };
        base.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(host) = lookup("HOST").filter(|h| !h.is_empty()) {
            self.host = host;
        }
        if let Some(port) = lookup("PORT").filter(|p| !p.is_empty()) {
            self.port = port
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {}", port))?;
        }
        if let Some(redirect_uri) = lookup("REDIRECT_URI").filter(|u| !u.is_empty()) {
            self.redirect_uri = redirect_uri;
        }
        if let Some(origins) = lookup("ALLOWED_ORIGINS") {
            self.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(self)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
