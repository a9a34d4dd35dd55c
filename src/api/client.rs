//! HTTP client for the n8n public REST API
//!
//! Every request carries the `X-N8N-API-KEY` header. Non-2xx responses become
//! `SyncError::Transport` with the status and body, 404 on single-workflow
//! lookups becomes `SyncError::NotFound`.

use crate::api::WorkflowClient;
use crate::config::Config;
use crate::error::{SyncError, SyncResult};
use crate::workflow::WorkflowRecord;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const API_KEY_HEADER: &str = "X-N8N-API-KEY";

/// Envelope of `GET /workflows`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkflowList {
    #[serde(default)]
    data: Vec<WorkflowRecord>,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// reqwest-backed `WorkflowClient`
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    /// API root, e.g. "https://host/api/v1"
    base_url: String,
    api_key: String,
}

impl HttpClient {
    pub fn new(config: &Config) -> Self {
        Self::with_base_url(config.api_base_url(), config.api_key())
    }

    /// Build against an explicit API root (already including `/api/v1`)
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("🌍 {} {}", method, url);
        self.client
            .request(method, url)
            .header(API_KEY_HEADER, &self.api_key)
            .header("Accept", "application/json")
    }

    /// Send a request and return the response body of a successful call
    ///
    /// `not_found` names the workflow id that a 404 should be reported for.
    async fn send(
        &self,
        request: RequestBuilder,
        accepted: &[StatusCode],
        not_found: Option<&str>,
    ) -> SyncResult<String> {
        let response = request.send().await.map_err(|e| SyncError::Transport {
            status: None,
            message: e.to_string(),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| SyncError::Transport {
            status: Some(status.as_u16()),
            message: format!("failed to read response body: {}", e),
        })?;
        tracing::debug!("📡 Response status: {}", status);

        if let (StatusCode::NOT_FOUND, Some(id)) = (status, not_found) {
            return Err(SyncError::NotFound(id.to_string()));
        }
        if !accepted.contains(&status) {
            return Err(SyncError::Transport {
                status: Some(status.as_u16()),
                message: body,
            });
        }
        Ok(body)
    }

    fn decode<T: DeserializeOwned>(body: &str, what: &str) -> SyncResult<T> {
        serde_json::from_str(body).map_err(|e| SyncError::decode(format!("{} response", what), e))
    }

    async fn set_active(&self, id: &str, active: bool) -> SyncResult<WorkflowRecord> {
        let action = if active { "activate" } else { "deactivate" };
        let request = self.request(Method::POST, &format!("/workflows/{}/{}", id, action));
        let body = self.send(request, &[StatusCode::OK], Some(id)).await?;
        Self::decode(&body, action)
    }
}

impl WorkflowClient for HttpClient {
    async fn list_workflows(&self) -> SyncResult<Vec<WorkflowRecord>> {
        let request = self.request(Method::GET, "/workflows");
        let body = self.send(request, &[StatusCode::OK], None).await?;
        let list: WorkflowList = Self::decode(&body, "list workflows")?;
        if list.next_cursor.is_some() {
            tracing::debug!("Workflow list has further pages; only the first page is used");
        }
        Ok(list.data)
    }

    async fn get_workflow(&self, id: &str) -> SyncResult<WorkflowRecord> {
        let request = self.request(Method::GET, &format!("/workflows/{}", id));
        let body = self.send(request, &[StatusCode::OK], Some(id)).await?;
        Self::decode(&body, "get workflow")
    }

    async fn create_workflow(&self, workflow: &WorkflowRecord) -> SyncResult<WorkflowRecord> {
        let request = self
            .request(Method::POST, "/workflows")
            .json(&workflow.to_payload()?);
        let body = self
            .send(request, &[StatusCode::OK, StatusCode::CREATED], None)
            .await?;
        let created: WorkflowRecord = Self::decode(&body, "create workflow")?;
        if created.id().is_none() {
            return Err(SyncError::decode(
                "create workflow response",
                "server did not return a workflow id",
            ));
        }
        Ok(created)
    }

    async fn update_workflow(&self, id: &str, workflow: &WorkflowRecord) -> SyncResult<WorkflowRecord> {
        let request = self
            .request(Method::PUT, &format!("/workflows/{}", id))
            .json(&workflow.to_payload()?);
        let body = self.send(request, &[StatusCode::OK], Some(id)).await?;
        Self::decode(&body, "update workflow")
    }

    async fn delete_workflow(&self, id: &str) -> SyncResult<()> {
        let request = self.request(Method::DELETE, &format!("/workflows/{}", id));
        self.send(request, &[StatusCode::OK, StatusCode::NO_CONTENT], Some(id))
            .await?;
        Ok(())
    }

    async fn activate_workflow(&self, id: &str) -> SyncResult<WorkflowRecord> {
        self.set_active(id, true).await
    }

    async fn deactivate_workflow(&self, id: &str) -> SyncResult<WorkflowRecord> {
        self.set_active(id, false).await
    }
}
