//! CLI module for azurerm-network
//!
//! Argument parsing and subcommand dispatch.

pub mod commands;
pub mod completions;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// azurerm-network - Azure network resources from the command line
///
/// Manages network interfaces and network security rules, and lists
/// ExpressRoute service providers, through Azure Resource Manager.
#[derive(Parser, Debug, Clone)]
#[command(name = "azurerm-network")]
#[command(author = "azurerm-network Contributors")]
#[command(version)]
#[command(about = "Azure Resource Manager network resources", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub output: OutputFormat,

    /// Use the in-memory mock service instead of Azure
    #[arg(long, global = true)]
    pub mock: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subscription id, overriding the configuration
    #[arg(long, global = true)]
    pub subscription: Option<String>,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output for scripting
    Json,
    /// YAML output
    Yaml,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Manage network interfaces
    Nic(commands::nic::NicArgs),

    /// Manage network security rules
    #[command(name = "security-rule")]
    SecurityRule(commands::security_rule::SecurityRuleArgs),

    /// Query ExpressRoute
    #[command(name = "express-route")]
    ExpressRoute(commands::express_route::ExpressRouteArgs),

    /// Run a declarative module
    Module(commands::module::ModuleArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the completions command
#[derive(Parser, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }
}

/// Split `key=value` arguments.
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}
