//! Arcade HTTP client

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::protocol::{
    AuthorizationResponse, AuthorizationStatus, AuthorizeToolRequest, ExecuteToolRequest,
    ExecuteToolResponse, ToolDefinition, ToolPage,
};
use crate::AUTH_STATUS_WAIT_SECS;

/// Page size used when walking the tool listing
const PAGE_SIZE: usize = 50;

/// Client for the Arcade tool service
#[derive(Clone)]
pub struct ArcadeClient {
    base_url: Url,
    api_key: String,
    http: Client,
}

impl ArcadeClient {
    /// Request timeout; must outlast a status long-poll
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(AUTH_STATUS_WAIT_SECS + 15);

    /// Create a client against `base_url`; a path prefix is kept
    pub fn with_base_url(api_key: impl Into<String>, base_url: &str) -> Result<Self, ArcadeError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| ArcadeError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        // Url::join replaces the last segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("tollgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ArcadeError::Transport(e.to_string()))?;

        Ok(Self {
            base_url,
            api_key: api_key.into(),
            http,
        })
    }

    /// Build an endpoint URL below the base URL
    pub fn endpoint(&self, path: &str) -> Result<Url, ArcadeError> {
        self.base_url
            .join(path)
            .map_err(|e| ArcadeError::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// List the tools of one toolkit, up to `limit` definitions
    pub async fn list_tools(
        &self,
        toolkit: &str,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ToolDefinition>, ArcadeError> {
        let url = self.endpoint("v1/tools")?;
        let mut tools = Vec::new();

        while tools.len() < limit {
            let page_size = PAGE_SIZE.min(limit - tools.len());
            let offset = tools.len();
            let request = self.http.get(url.clone()).query(&[
                ("toolkit", toolkit.to_string()),
                ("user_id", user_id.to_string()),
                ("limit", page_size.to_string()),
                ("offset", offset.to_string()),
            ]);

            let page: ToolPage = self.send(request).await?;
            let fetched = page.items.len();
            tools.extend(page.items);

            let exhausted = page
                .total_count
                .map(|total| tools.len() as u64 >= total)
                .unwrap_or(false);
            if fetched < page_size || exhausted {
                break;
            }
        }

        debug!(toolkit, count = tools.len(), "Listed tools");
        Ok(tools)
    }

    /// Fetch a single tool definition by qualified name
    pub async fn get_tool(&self, name: &str) -> Result<ToolDefinition, ArcadeError> {
        let url = self.endpoint(&format!("v1/tools/{}", name))?;
        self.send(self.http.get(url)).await
    }

    /// Start (or look up) the authorization for a tool on behalf of a user
    pub async fn authorize(
        &self,
        tool_name: &str,
        user_id: &str,
    ) -> Result<AuthorizationResponse, ArcadeError> {
        let url = self.endpoint("v1/tools/authorize")?;
        let body = AuthorizeToolRequest { tool_name, user_id };
        let response: AuthorizationResponse = self.send(self.http.post(url).json(&body)).await?;
        debug!(tool_name, status = %response.status, "Authorization checked");
        Ok(response)
    }

    /// Read the status of an authorization, holding the request open up to `wait_secs`
    pub async fn auth_status(
        &self,
        id: &str,
        wait_secs: u64,
    ) -> Result<AuthorizationResponse, ArcadeError> {
        let url = self.endpoint("v1/auth/status")?;
        let request = self
            .http
            .get(url)
            .query(&[("id", id.to_string()), ("wait", wait_secs.to_string())]);
        self.send(request).await
    }

    /// Block until the user completes (or abandons) an authorization.
    ///
    /// There is no overall deadline: the status endpoint is long-polled
    /// until it reports a terminal state or the request fails.
    pub async fn wait_for_completion(&self, id: &str) -> Result<AuthorizationResponse, ArcadeError> {
        loop {
            let response = self.auth_status(id, AUTH_STATUS_WAIT_SECS).await?;
            match response.status {
                AuthorizationStatus::Completed => {
                    info!(id, "Authorization completed");
                    return Ok(response);
                }
                status if status.is_waiting() => {
                    debug!(id, %status, "Authorization still pending")
                }
                _ => return Err(ArcadeError::AuthorizationFailed(id.to_string())),
            }
        }
    }

    /// Execute a tool for a user
    pub async fn execute(
        &self,
        tool_name: &str,
        input: &Value,
        user_id: &str,
    ) -> Result<ExecuteToolResponse, ArcadeError> {
        let url = self.endpoint("v1/tools/execute")?;
        let body = ExecuteToolRequest {
            tool_name,
            input,
            user_id,
        };
        self.send(self.http.post(url).json(&body)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ArcadeError> {
        let response = request
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ArcadeError::Transport(e.to_string()))?;

        let response = check_status(response).await?;

        response
            .json::<T>()
            .await
            .map_err(|e| ArcadeError::Protocol(e.to_string()))
    }
}

async fn check_status(response: Response) -> Result<Response, ArcadeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ArcadeError::Api {
        status: status.as_u16(),
        message: api_error_message(&body),
    })
}

/// Pull a readable message out of an error body
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Arcade client errors
#[derive(Debug, thiserror::Error)]
pub enum ArcadeError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),
}
