//! Bearer-token acquisition for Azure Resource Manager.
//!
//! Two credentials are supported: a pre-acquired token handed in through the
//! configuration, and a service principal using the OAuth2 client-credentials
//! grant. The latter caches its token and refreshes it shortly before expiry.

use crate::config::AzureConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Tokens with less than this lifetime left are refreshed.
const REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// An OAuth2 bearer token.
#[derive(Clone)]
pub struct AccessToken {
    /// The raw token
    pub token: String,
    /// When the token stops being valid
    pub expires_at: Instant,
}

impl AccessToken {
    /// Create a token valid for `lifetime`.
    pub fn new(token: impl Into<String>, lifetime: Duration) -> Self {
        Self {
            token: token.into(),
            expires_at: Instant::now() + lifetime,
        }
    }

    /// Whether the token is expired or about to expire.
    pub fn needs_refresh(&self) -> bool {
        self.expires_at.saturating_duration_since(Instant::now()) < REFRESH_MARGIN
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Source of bearer tokens for ARM requests.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Return a token valid for at least a few more minutes.
    async fn token(&self) -> Result<AccessToken>;
}

// ============================================================================
// Static token
// ============================================================================

/// A credential that always returns the same token.
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    /// Wrap a pre-acquired token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for StaticTokenCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenCredential")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn token(&self) -> Result<AccessToken> {
        // Lifetime is unknown; report a day so callers never try to refresh.
        Ok(AccessToken::new(self.token.clone(), Duration::from_secs(86_400)))
    }
}

// ============================================================================
// Client credentials
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<ExpiresIn>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExpiresIn {
    Seconds(u64),
    Text(String),
}

impl ExpiresIn {
    fn as_duration(&self) -> Duration {
        let secs = match self {
            Self::Seconds(s) => *s,
            Self::Text(s) => s.parse().unwrap_or(0),
        };
        Duration::from_secs(secs)
    }
}

#[derive(Debug, Default, Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

/// Service principal credential using the client-credentials grant.
pub struct ClientSecretCredential {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
    cache: RwLock<Option<AccessToken>>,
}

impl ClientSecretCredential {
    /// Create a credential for `tenant_id` against `authority_host`, requesting
    /// a token for `resource` (the ARM endpoint).
    pub fn new(
        authority_host: &str,
        tenant_id: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        resource: &str,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            token_url: format!(
                "{}/{}/oauth2/v2.0/token",
                authority_host.trim_end_matches('/'),
                tenant_id
            ),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: format!("{}/.default", resource.trim_end_matches('/')),
            cache: RwLock::new(None),
        })
    }

    async fn request_token(&self) -> Result<AccessToken> {
        debug!(url = %self.token_url, client_id = %self.client_id, "Requesting Azure AD token");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::Authentication(format!("Token request failed: {e}")))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let detail: TokenErrorResponse = serde_json::from_str(&body).unwrap_or_default();
            let message = if detail.error.is_empty() {
                format!("token endpoint returned {status}")
            } else {
                format!("{}: {}", detail.error, detail.error_description)
            };
            return Err(Error::Authentication(message));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Authentication(format!("Malformed token response: {e}")))?;

        let lifetime = parsed
            .expires_in
            .as_ref()
            .map(ExpiresIn::as_duration)
            .unwrap_or(Duration::from_secs(3600));

        Ok(AccessToken::new(parsed.access_token, lifetime))
    }
}

impl fmt::Debug for ClientSecretCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecretCredential")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scope", &self.scope)
            .finish()
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn token(&self) -> Result<AccessToken> {
        {
            let cached = self.cache.read().await;
            if let Some(token) = cached.as_ref().filter(|t| !t.needs_refresh()) {
                return Ok(token.clone());
            }
        }

        let mut cache = self.cache.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(token) = cache.as_ref().filter(|t| !t.needs_refresh()) {
            return Ok(token.clone());
        }

        let token = self.request_token().await?;
        *cache = Some(token.clone());
        Ok(token)
    }
}

/// Pick a credential: a static token first, then the service principal.
pub fn credential_from_config(azure: &AzureConfig) -> Result<Arc<dyn TokenCredential>> {
    if let Some(token) = &azure.access_token {
        return Ok(Arc::new(StaticTokenCredential::new(token.clone())));
    }

    match (&azure.tenant_id, &azure.client_id, &azure.client_secret) {
        (Some(tenant), Some(client_id), Some(secret)) => Ok(Arc::new(ClientSecretCredential::new(
            &azure.authority_host(),
            tenant,
            client_id.clone(),
            secret.clone(),
            &azure.resource_manager_endpoint(),
        )?)),
        _ => Err(Error::Config(
            "No Azure credentials configured. Set AZURE_ACCESS_TOKEN or AZURE_TENANT_ID, \
             AZURE_CLIENT_ID and AZURE_CLIENT_SECRET"
                .to_string(),
        )),
    }
}
