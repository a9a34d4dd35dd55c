//! Configuration management for n8n-sync
//!
//! Resolves the n8n instance URL and API key from flags, the environment and an
//! optional `.env` file. The resulting `Config` is passed explicitly to the HTTP
//! client; nothing is stored globally.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

pub const API_KEY_VAR: &str = "N8N_API_KEY";
pub const INSTANCE_URL_VAR: &str = "N8N_INSTANCE_URL";

const API_PATH: &str = "/api/v1";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// n8n instance configuration
    pub instance: InstanceConfig,
}

/// Connection details for one n8n instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// Instance URL as given by the user (e.g., "https://acme.app.n8n.cloud")
    pub url: String,
    /// Value sent in the `X-N8N-API-KEY` header
    pub api_key: String,
}

impl Config {
    /// Build from explicit values, falling back to the environment for missing ones
    ///
    /// A `.env` file in the working directory is loaded first when present.
    pub fn resolve(url: Option<String>, api_key: Option<String>) -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Ignoring unreadable .env file: {}", e);
            }
        }

        let url = url
            .or_else(|| std::env::var(INSTANCE_URL_VAR).ok())
            .filter(|v| !v.trim().is_empty());
        let api_key = api_key
            .or_else(|| std::env::var(API_KEY_VAR).ok())
            .filter(|v| !v.trim().is_empty());

        match (url, api_key) {
            (Some(url), Some(api_key)) => Ok(Self {
                instance: InstanceConfig { url, api_key },
            }),
            _ => bail!(
                "{} and {} must be set (environment, .env file, or --url/--api-key)",
                API_KEY_VAR,
                INSTANCE_URL_VAR
            ),
        }
    }

    /// Build purely from the environment
    pub fn from_env() -> Result<Self> {
        Self::resolve(None, None)
    }

    /// Base URL of the public REST API, e.g. "https://host/api/v1"
    pub fn api_base_url(&self) -> String {
        format_api_base_url(&self.instance.url)
    }

    pub fn api_key(&self) -> &str {
        &self.instance.api_key
    }
}

/// Trim a trailing slash and append `/api/v1` unless it is already there
pub fn format_api_base_url(instance_url: &str) -> String {
    let trimmed = instance_url.trim().trim_end_matches('/');
    if trimmed.ends_with(API_PATH) {
        trimmed.to_string()
    } else {
        format!("{}{}", trimmed, API_PATH)
    }
}
