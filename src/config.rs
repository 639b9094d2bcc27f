//! Configuration module for azurerm-network
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - System configuration (/etc/azurerm-network/config.toml)
//! - User configuration (~/.azurerm-network/config.toml)
//! - Project configuration (./azurerm-network.toml)
//! - Environment variables

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default ARM API version for Microsoft.Network
pub const DEFAULT_API_VERSION: &str = "2023-09-01";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Credentials, subscription and cloud selection
    pub azure: AzureConfig,

    /// HTTP client behaviour
    pub client: ClientConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Azure sovereign clouds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AzureEnvironment {
    /// Public Azure
    #[default]
    AzureCloud,
    /// Azure operated by 21Vianet
    AzureChinaCloud,
    /// Azure Government
    #[serde(rename = "AzureUSGovernment")]
    AzureUsGovernment,
    /// Azure Germany
    AzureGermanCloud,
}

impl AzureEnvironment {
    /// Resource Manager endpoint for this cloud.
    pub fn resource_manager_endpoint(self) -> &'static str {
        match self {
            Self::AzureCloud => "https://management.azure.com",
            Self::AzureChinaCloud => "https://management.chinacloudapi.cn",
            Self::AzureUsGovernment => "https://management.usgovcloudapi.net",
            Self::AzureGermanCloud => "https://management.microsoftazure.de",
        }
    }

    /// Azure Active Directory authority for this cloud.
    pub fn authority_host(self) -> &'static str {
        match self {
            Self::AzureCloud => "https://login.microsoftonline.com",
            Self::AzureChinaCloud => "https://login.chinacloudapi.cn",
            Self::AzureUsGovernment => "https://login.microsoftonline.us",
            Self::AzureGermanCloud => "https://login.microsoftonline.de",
        }
    }
}

impl FromStr for AzureEnvironment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "azurecloud" | "public" => Ok(Self::AzureCloud),
            "azurechinacloud" | "china" => Ok(Self::AzureChinaCloud),
            "azureusgovernment" | "usgovernment" => Ok(Self::AzureUsGovernment),
            "azuregermancloud" | "german" => Ok(Self::AzureGermanCloud),
            _ => Err(Error::Config(format!(
                "Unknown Azure environment '{s}'. Valid values: AzureCloud, AzureChinaCloud, \
                 AzureUSGovernment, AzureGermanCloud"
            ))),
        }
    }
}

impl fmt::Display for AzureEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AzureCloud => write!(f, "AzureCloud"),
            Self::AzureChinaCloud => write!(f, "AzureChinaCloud"),
            Self::AzureUsGovernment => write!(f, "AzureUSGovernment"),
            Self::AzureGermanCloud => write!(f, "AzureGermanCloud"),
        }
    }
}

/// Credentials and subscription settings
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureConfig {
    /// Azure AD tenant id
    pub tenant_id: Option<String>,

    /// Service principal client id
    pub client_id: Option<String>,

    /// Service principal secret
    pub client_secret: Option<String>,

    /// Subscription the resources live in
    pub subscription_id: Option<String>,

    /// Pre-acquired bearer token, used instead of the service principal
    pub access_token: Option<String>,

    /// Sovereign cloud
    pub environment: AzureEnvironment,

    /// Override for the Resource Manager endpoint
    pub resource_manager_endpoint: Option<String>,

    /// Override for the AAD authority
    pub authority_host: Option<String>,

    /// Serve every request from the in-memory mock service
    pub mock: bool,
}

impl fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("subscription_id", &self.subscription_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("environment", &self.environment)
            .field("resource_manager_endpoint", &self.resource_manager_endpoint)
            .field("authority_host", &self.authority_host)
            .field("mock", &self.mock)
            .finish()
    }
}

impl AzureConfig {
    /// Effective Resource Manager endpoint, without a trailing slash.
    pub fn resource_manager_endpoint(&self) -> String {
        self.resource_manager_endpoint
            .as_deref()
            .unwrap_or_else(|| self.environment.resource_manager_endpoint())
            .trim_end_matches('/')
            .to_string()
    }

    /// Effective AAD authority, without a trailing slash.
    pub fn authority_host(&self) -> String {
        self.authority_host
            .as_deref()
            .unwrap_or_else(|| self.environment.authority_host())
            .trim_end_matches('/')
            .to_string()
    }

    /// Subscription id or a configuration error.
    pub fn subscription(&self) -> Result<&str> {
        self.subscription_id.as_deref().ok_or_else(|| {
            Error::Config(
                "No subscription configured. Set azure.subscription_id or AZURE_SUBSCRIPTION_ID"
                    .to_string(),
            )
        })
    }

    /// Whether a full service principal is configured.
    pub fn has_service_principal(&self) -> bool {
        self.tenant_id.is_some() && self.client_id.is_some() && self.client_secret.is_some()
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// ARM api-version sent with every request
    pub api_version: String,

    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Maximum number of retries for throttled or failed requests
    pub max_retries: u32,

    /// Initial retry delay
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,

    /// Interval between polls of a long-running operation
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Upper bound on the time spent waiting for a long-running operation
    #[serde(with = "humantime_serde")]
    pub operation_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            poll_interval: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(600),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human readable output
    #[default]
    Pretty,
    /// Single-line human readable output
    Compact,
    /// Structured JSON lines
    Json,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level when neither RUST_LOG nor -v is given
    pub level: String,

    /// Log format
    pub format: LogFormat,

    /// Log file; logs go to stderr when unset
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

/// Partial configuration as read from a single file; only set keys override.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    azure: AzureFile,
    client: ClientFile,
    logging: LoggingFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AzureFile {
    tenant_id: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    subscription_id: Option<String>,
    access_token: Option<String>,
    environment: Option<AzureEnvironment>,
    resource_manager_endpoint: Option<String>,
    authority_host: Option<String>,
    mock: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ClientFile {
    api_version: Option<String>,
    #[serde(with = "humantime_serde")]
    timeout: Option<Duration>,
    max_retries: Option<u32>,
    #[serde(with = "humantime_serde")]
    retry_delay: Option<Duration>,
    #[serde(with = "humantime_serde")]
    poll_interval: Option<Duration>,
    #[serde(with = "humantime_serde")]
    operation_timeout: Option<Duration>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoggingFile {
    level: Option<String>,
    format: Option<LogFormat>,
    file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();
        let explicit = config_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("AZURERM_NETWORK_CONFIG").map(PathBuf::from));

        for path in Self::get_config_paths(explicit.as_deref()) {
            if path.exists() {
                config.merge_from_file(&path)?;
            } else if explicit.is_some() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
        }

        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Load from a single file on top of the defaults, without env overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Config::default();
        config.merge_from_file(path.as_ref())?;
        Ok(config)
    }

    /// Get the list of configuration file paths to check
    fn get_config_paths(explicit_path: Option<&Path>) -> Vec<PathBuf> {
        if let Some(path) = explicit_path {
            return vec![path.to_path_buf()];
        }

        let mut paths = vec![PathBuf::from("/etc/azurerm-network/config.toml")];

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".azurerm-network/config.toml"));
        }

        paths.push(PathBuf::from("azurerm-network.toml"));

        paths
    }

    /// Merge configuration from a file
    fn merge_from_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let parse_error =
            |e: String| Error::Config(format!("Failed to parse config file {}: {e}", path.display()));

        let file: ConfigFile = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
            "json" => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
            _ => toml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
        };

        self.merge(file);
        Ok(())
    }

    /// Overlay the keys set in `file` onto this configuration
    fn merge(&mut self, file: ConfigFile) {
        let azure = &mut self.azure;
        let a = file.azure;
        overlay(&mut azure.tenant_id, a.tenant_id);
        overlay(&mut azure.client_id, a.client_id);
        overlay(&mut azure.client_secret, a.client_secret);
        overlay(&mut azure.subscription_id, a.subscription_id);
        overlay(&mut azure.access_token, a.access_token);
        overlay(&mut azure.resource_manager_endpoint, a.resource_manager_endpoint);
        overlay(&mut azure.authority_host, a.authority_host);
        if let Some(environment) = a.environment {
            azure.environment = environment;
        }
        if let Some(mock) = a.mock {
            azure.mock = mock;
        }

        let client = &mut self.client;
        let c = file.client;
        if let Some(v) = c.api_version {
            client.api_version = v;
        }
        if let Some(v) = c.timeout {
            client.timeout = v;
        }
        if let Some(v) = c.max_retries {
            client.max_retries = v;
        }
        if let Some(v) = c.retry_delay {
            client.retry_delay = v;
        }
        if let Some(v) = c.poll_interval {
            client.poll_interval = v;
        }
        if let Some(v) = c.operation_timeout {
            client.operation_timeout = v;
        }

        let logging = &mut self.logging;
        let l = file.logging;
        if let Some(v) = l.level {
            logging.level = v;
        }
        if let Some(v) = l.format {
            logging.format = v;
        }
        overlay(&mut logging.file, l.file);
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());

        overlay(&mut self.azure.tenant_id, env("AZURE_TENANT_ID"));
        overlay(&mut self.azure.client_id, env("AZURE_CLIENT_ID"));
        overlay(&mut self.azure.client_secret, env("AZURE_CLIENT_SECRET"));
        overlay(&mut self.azure.subscription_id, env("AZURE_SUBSCRIPTION_ID"));
        overlay(&mut self.azure.access_token, env("AZURE_ACCESS_TOKEN"));

        if let Some(environment) = env("AZURE_ENVIRONMENT") {
            self.azure.environment = environment.parse()?;
        }

        if let Some(mock) = env("AZURERM_NETWORK_MOCK") {
            self.azure.mock = matches!(mock.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }

        if let Some(api_version) = env("AZURERM_NETWORK_API_VERSION") {
            self.client.api_version = api_version;
        }

        if let Some(level) = env("AZURERM_NETWORK_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Check that enough is configured to talk to Azure
    pub fn validate(&self) -> Result<()> {
        if self.azure.mock {
            return Ok(());
        }

        self.azure.subscription()?;

        if self.azure.access_token.is_none() && !self.azure.has_service_principal() {
            return Err(Error::Config(
                "No Azure credentials configured. Set AZURE_ACCESS_TOKEN or the service \
                 principal triple (AZURE_TENANT_ID, AZURE_CLIENT_ID, AZURE_CLIENT_SECRET)"
                    .to_string(),
            ));
        }

        if self.client.api_version.trim().is_empty() {
            return Err(Error::Config("client.api_version must not be empty".to_string()));
        }

        Ok(())
    }
}

fn overlay<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}
