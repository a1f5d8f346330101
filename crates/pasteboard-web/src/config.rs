//! Configuration loading from environment variables.

use std::path::Path;

use anyhow::{Context as _, Result};
use pasteboard_crypto::keys::{generate_secret_key, key_from_base64};
use tracing::warn;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://paste.db";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// HMAC key for session cookies.
    pub secret_key: [u8; 32],
    /// Absolute URL root for sitemap links; the request `Host` is used when unset.
    pub public_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port: {raw}"))?,
            None => DEFAULT_PORT,
        };

        let secret_key = match get("PASTEBOARD_SECRET_KEY") {
            Some(raw) => key_from_base64(&raw).context("PASTEBOARD_SECRET_KEY must be 32 bytes of base64")?,
            None => {
                warn!("PASTEBOARD_SECRET_KEY unset; sessions will not survive a restart");
                generate_secret_key()
            }
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.into()),
            port,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            secret_key,
            public_url: get("PASTEBOARD_PUBLIC_URL").map(|url| url.trim_end_matches('/').to_string()),
        })
    }

    pub fn db_path(&self) -> &Path {
        pasteboard_db::path_from_url(&self.database_url)
    }
}
