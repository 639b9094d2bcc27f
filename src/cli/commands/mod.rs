//! Subcommands of the azurerm-network CLI

pub mod express_route;
pub mod module;
pub mod nic;
pub mod security_rule;

use crate::cli::output::OutputFormatter;
use azurerm_network::config::Config;
use azurerm_network::service::NetworkService;
use std::sync::Arc;

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Output formatter
    pub output: OutputFormatter,
    /// Service every command talks to
    pub service: Arc<dyn NetworkService>,
}

impl CommandContext {
    /// Create a new command context
    pub fn new(config: Config, output: OutputFormatter, service: Arc<dyn NetworkService>) -> Self {
        Self {
            config,
            output,
            service,
        }
    }

    /// Whether commands are served by the in-memory mock
    pub fn is_mock(&self) -> bool {
        self.config.azure.mock
    }
}
