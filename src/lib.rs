//! # azurerm-network - Azure Resource Manager network resources
//!
//! Network interfaces, network security rules and ExpressRoute service
//! providers behind a uniform "model + service" abstraction.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                  CLI / declarative modules                           │
//! │        (azure_network_interface, azure_security_rule, ...)           │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        Resource models                               │
//! │   (NetworkInterface, NetworkSecurityRule, ExpressRouteServiceProvider)│
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                   NetworkService (trait object)                      │
//! │       AzureNetworkService            MockNetworkService              │
//! └─────────────────────────────────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │        ArmClient: auth, api-version, retries, paging, LRO polling    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use azurerm_network::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load(None)?;
//!     let service = service_from_config(&config)?;
//!
//!     let nics = NetworkInterfaces::new(service.clone());
//!     let mut nic = nics.get("my-rg", "my-nic").await?;
//!     nic.attach_public_ip(service.as_ref(), "/subscriptions/.../publicIPAddresses/pip").await?;
//!
//!     println!("{:?}", nic.public_ip_address_id);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::config::{AzureConfig, ClientConfig, Config, LoggingConfig};
    pub use crate::error::{Error, Result};
    pub use crate::models::{
        IpAllocationMethod, SecurityRuleAccess, SecurityRuleDirection, SecurityRuleProtocol,
    };
    pub use crate::modules::{
        Module, ModuleContext, ModuleOutput, ModuleParams, ModuleRegistry, ModuleResult,
        ModuleStatus,
    };
    pub use crate::network::{
        ExpressRouteServiceProvider, ExpressRouteServiceProviders, NetworkInterface,
        NetworkInterfaces, NetworkSecurityRule, NetworkSecurityRules,
    };
    pub use crate::resource_id::ResourceId;
    pub use crate::service::{
        service_from_config, AzureNetworkService, MockNetworkService, NetworkService, NicResource,
    };
}

// ============================================================================
// Ambient
// ============================================================================

/// Error types and result aliases.
pub mod error;

/// Layered configuration: files, environment, defaults.
pub mod config;

/// `tracing` subscriber setup.
pub mod logging;

/// Backoff and jitter for retried requests.
pub mod retry;

// ============================================================================
// Transport
// ============================================================================

/// Bearer token acquisition.
pub mod auth;

/// Parsing and building ARM resource ids.
pub mod resource_id;

/// HTTP client for Azure Resource Manager.
pub mod client;

// ============================================================================
// Resources
// ============================================================================

/// Wire models matching the ARM JSON payloads.
pub mod models;

/// One async method per ARM round trip, real or mocked.
pub mod service;

/// Flat resource models and their collections.
pub mod network;

/// Desired-state modules over the resource models.
pub mod modules;

/// Returns the current version of azurerm-network.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
