//! HTTP client for Azure Resource Manager.
//!
//! Wraps `reqwest` with the ARM conventions: bearer authentication, the
//! `api-version` query parameter, per-request correlation ids, `nextLink`
//! pagination, retries of throttled or failed requests, and polling of
//! long-running operations.

use crate::auth::{credential_from_config, TokenCredential};
use crate::config::{AzureConfig, ClientConfig, Config};
use crate::error::{is_retryable_status, ArmErrorDetail, Error, Result};
use crate::models::ListResult;
use crate::retry::RetryPolicy;
use reqwest::header::{HeaderMap, LOCATION, RETRY_AFTER};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};
use url::Url;
use uuid::Uuid;

const AZURE_ASYNC_OPERATION: &str = "azure-asyncoperation";
const CLIENT_REQUEST_ID: &str = "x-ms-client-request-id";
const USER_AGENT: &str = concat!("azurerm-network/", env!("CARGO_PKG_VERSION"));

/// Body of an `Azure-AsyncOperation` status resource.
#[derive(Debug, Deserialize)]
struct OperationStatus {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error: Option<ArmErrorDetail>,
}

/// Client for the ARM REST API.
#[derive(Clone)]
pub struct ArmClient {
    http: Client,
    endpoint: String,
    api_version: String,
    credential: Arc<dyn TokenCredential>,
    retry: RetryPolicy,
    poll_interval: Duration,
    operation_timeout: Duration,
}

impl std::fmt::Debug for ArmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArmClient")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl ArmClient {
    /// Create a client for the endpoint in `azure` using `credential`.
    pub fn new(
        azure: &AzureConfig,
        client: &ClientConfig,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(client.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: azure.resource_manager_endpoint(),
            api_version: client.api_version.clone(),
            credential,
            retry: RetryPolicy::exponential(
                client.max_retries,
                client.retry_delay,
                Duration::from_secs(60),
            ),
            poll_interval: client.poll_interval,
            operation_timeout: client.operation_timeout,
        })
    }

    /// Create a client with the credential selected by the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let credential = credential_from_config(&config.azure)?;
        Self::new(&config.azure, &config.client, credential)
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The Resource Manager endpoint requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The `api-version` sent with every request.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// GET a resource.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, context: &str) -> Result<T> {
        let response = self.send(Method::GET, path, None).await?;
        let response = error_for_status(response, context).await?;
        read_json(response, context).await
    }

    /// GET a resource, mapping 404 to `None`.
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        context: &str,
    ) -> Result<Option<T>> {
        let response = self.send(Method::GET, path, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = error_for_status(response, context).await?;
        Ok(Some(read_json(response, context).await?))
    }

    /// PUT a resource and return its state once provisioning finished.
    pub async fn put<B, T>(&self, path: &str, body: &B, context: &str) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let response = self.send(Method::PUT, path, Some(&body)).await?;
        let response = error_for_status(response, context).await?;
        let status = response.status();

        if status == StatusCode::ACCEPTED
            || (status == StatusCode::CREATED && has_operation_header(response.headers()))
        {
            let headers = response.headers().clone();
            self.wait_for_completion(&headers, context).await?;
            return self.get(path, context).await;
        }

        read_json(response, context).await
    }

    /// DELETE a resource. Returns `false` when there was nothing to delete.
    pub async fn delete(&self, path: &str, context: &str) -> Result<bool> {
        let response = self.send(Method::DELETE, path, None).await?;

        if matches!(
            response.status(),
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT
        ) {
            return Ok(false);
        }

        let response = error_for_status(response, context).await?;
        if response.status() == StatusCode::ACCEPTED || has_operation_header(response.headers()) {
            let headers = response.headers().clone();
            self.wait_for_completion(&headers, context).await?;
        }

        Ok(true)
    }

    /// GET a collection, following `nextLink` until exhausted.
    pub async fn list<T: DeserializeOwned>(&self, path: &str, context: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(path.to_string());
        let mut pages = 0usize;

        while let Some(url) = next.take() {
            let response = self.send(Method::GET, &url, None).await?;
            let response = error_for_status(response, context).await?;
            let page: ListResult<T> = read_json(response, context).await?;

            pages += 1;
            items.extend(page.value);
            next = page.next_link.filter(|link| !link.is_empty());
        }

        trace!(path = %path, pages, count = items.len(), "Listed ARM collection");
        Ok(items)
    }

    /// Poll a long-running operation until it reaches a terminal state.
    async fn wait_for_completion(&self, headers: &HeaderMap, context: &str) -> Result<()> {
        let (url, is_async_operation) = if let Some(url) = header_str(headers, AZURE_ASYNC_OPERATION) {
            (url, true)
        } else if let Some(url) = header_str(headers, LOCATION.as_str()) {
            (url, false)
        } else {
            return Ok(());
        };

        debug!(url = %url, "Waiting for long-running operation");

        let deadline = Instant::now() + self.operation_timeout;
        let mut delay = retry_after(headers).unwrap_or(self.poll_interval);

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            tokio::time::sleep(delay.min(remaining)).await;

            let response = self.send(Method::GET, &url, None).await?;
            delay = retry_after(response.headers()).unwrap_or(self.poll_interval);
            let response = error_for_status(response, context).await?;

            if is_async_operation {
                let operation: OperationStatus = read_json(response, context).await?;
                match operation.status.to_ascii_lowercase().as_str() {
                    "succeeded" => return Ok(()),
                    "failed" | "canceled" | "cancelled" => {
                        let detail = operation.error.unwrap_or_else(|| ArmErrorDetail {
                            code: operation.status.clone(),
                            message: format!("Operation {}", operation.status),
                        });
                        return Err(Error::azure_operation(context, detail));
                    }
                    status => trace!(status, "Operation still running"),
                }
            } else if response.status() != StatusCode::ACCEPTED {
                return Ok(());
            }

            if Instant::now() >= deadline {
                return Err(Error::Timeout(format!(
                    "{context} did not complete within {:?}",
                    self.operation_timeout
                )));
            }
        }
    }

    /// Send a request, retrying throttled and transient failures.
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Response> {
        let url = self.request_url(path)?;
        let mut attempt = 0;

        loop {
            let token = self.credential.token().await?;
            let request_id = Uuid::new_v4().to_string();

            debug!(method = %method, url = %url, request_id = %request_id, "ARM request");

            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .bearer_auth(&token.token)
                .header(CLIENT_REQUEST_ID, &request_id);
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(response)
                    if is_retryable_status(response.status().as_u16())
                        && self.retry.should_continue(attempt) =>
                {
                    let delay = retry_after(response.headers())
                        .unwrap_or_else(|| self.retry.delay_for_attempt(attempt));
                    warn!(
                        status = %response.status(),
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "ARM request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Ok(response) => return Ok(response),
                Err(e) => {
                    let err = Error::from(e);
                    if !(err.is_retryable() && self.retry.should_continue(attempt)) {
                        return Err(err);
                    }
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(error = %err, attempt = attempt + 1, "ARM request failed, retrying");
                    tokio::time::sleep(delay).await;
                }
            }

            attempt += 1;
        }
    }

    /// Resolve `path` against the endpoint and make sure it carries `api-version`.
    fn request_url(&self, path: &str) -> Result<Url> {
        let raw = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
        };

        let mut url = Url::parse(&raw).map_err(|e| Error::Config(format!("Invalid URL '{raw}': {e}")))?;
        if !url.query_pairs().any(|(key, _)| key == "api-version") {
            url.query_pairs_mut().append_pair("api-version", &self.api_version);
        }
        Ok(url)
    }
}

async fn error_for_status(response: Response, context: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(Error::azure(context, status, &body))
}

/// Deserialize a successful response, keeping `context` on decode failures.
async fn read_json<T: DeserializeOwned>(response: Response, context: &str) -> Result<T> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|source| Error::Decode {
        context: context.to_string(),
        source,
    })
}


fn has_operation_header(headers: &HeaderMap) -> bool {
    headers.contains_key(AZURE_ASYNC_OPERATION) || headers.contains_key(LOCATION)
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// `Retry-After` in seconds. HTTP-date values are ignored.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
