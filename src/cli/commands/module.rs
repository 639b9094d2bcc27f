//! Module command - run one declarative module
//!
//! `azurerm-network module azure_network_interface -a name=nic -a resource_group=rg --check`

use super::CommandContext;
use crate::cli::parse_key_value;
use anyhow::Result;
use azurerm_network::error::Error;
use azurerm_network::modules::{ModuleContext, ModuleParams, ModuleRegistry};
use clap::Parser;
use serde_json::Value;

/// Arguments for the module command
#[derive(Parser, Debug, Clone)]
pub struct ModuleArgs {
    /// Module to run (omit with --list)
    #[arg(required_unless_present = "list")]
    pub name: Option<String>,

    /// Module argument as key=value; values are read as JSON when they parse (repeatable)
    #[arg(short = 'a', long = "arg", value_parser = parse_key_value)]
    pub args: Vec<(String, String)>,

    /// Report what would change without changing it
    #[arg(long = "check")]
    pub check_mode: bool,

    /// Show differences
    #[arg(long = "diff")]
    pub diff_mode: bool,

    /// List the available modules
    #[arg(long)]
    pub list: bool,
}

impl ModuleArgs {
    /// Build the parameter map from the `-a` arguments.
    pub fn params(&self) -> ModuleParams {
        self.args
            .iter()
            .map(|(key, value)| {
                let value =
                    serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.clone()));
                (key.clone(), value)
            })
            .collect()
    }

    /// Execute the module command
    pub async fn execute(&self, ctx: &CommandContext) -> Result<i32> {
        let registry = ModuleRegistry::with_builtins();

        let Some(name) = self.name.as_deref().filter(|_| !self.list) else {
            let names: Vec<String> = registry
                .names()
                .into_iter()
                .map(|name| match registry.get(name) {
                    Some(module) => format!("{} - {}", name, module.description()),
                    None => name.to_string(),
                })
                .collect();
            ctx.output
                .collection(&names, &["MODULE"], |line| vec![line.clone()])?;
            return Ok(0);
        };

        let context = ModuleContext::new(ctx.service.clone())
            .with_check_mode(self.check_mode)
            .with_diff_mode(self.diff_mode);

        let output = registry
            .execute(name, &self.params(), &context)
            .await
            .map_err(|e| Error::module(name, e.to_string()))?;

        ctx.output.module_result(name, &output)?;

        Ok(0)
    }
}
