//! CLI command implementations.
//!
//! Each submodule corresponds to a top-level CLI command and drives the
//! library through an `HttpClient` built from the resolved `Config`.

pub mod workflows;

use anyhow::Result;
use n8n_sync::{Config, HttpClient};

/// Resolve the instance configuration and build the API client
pub fn connect(url: Option<String>, api_key: Option<String>) -> Result<HttpClient> {
    let config = Config::resolve(url, api_key)?;
    tracing::debug!("🔌 Using n8n API at {}", config.api_base_url());
    Ok(HttpClient::new(&config))
}
