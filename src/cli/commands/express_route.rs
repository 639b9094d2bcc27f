//! ExpressRoute commands
//!
//! Implements `azurerm-network express-route ...`.

use super::CommandContext;
use anyhow::Result;
use azurerm_network::error::Error;
use azurerm_network::network::ExpressRouteServiceProviders;
use clap::{Args, Parser, Subcommand};

/// Arguments for the express-route command
#[derive(Parser, Debug, Clone)]
pub struct ExpressRouteArgs {
    #[command(subcommand)]
    pub action: ExpressRouteAction,
}

/// ExpressRoute subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ExpressRouteAction {
    /// List ExpressRoute service providers
    Providers(ProvidersArgs),
}

/// Arguments for `express-route providers`
#[derive(Args, Debug, Clone)]
pub struct ProvidersArgs {
    /// Only show the provider with this name
    #[arg(short = 'n', long)]
    pub name: Option<String>,
}

impl ExpressRouteArgs {
    /// Execute the express-route command
    pub async fn execute(&self, ctx: &CommandContext) -> Result<i32> {
        let providers = ExpressRouteServiceProviders::new(ctx.service.clone());

        match &self.action {
            ExpressRouteAction::Providers(args) => {
                let found = match &args.name {
                    Some(name) => match providers.get(name).await? {
                        Some(provider) => vec![provider],
                        None => {
                            return Err(Error::NotFound(format!(
                                "ExpressRoute service provider '{name}' not found"
                            ))
                            .into())
                        }
                    },
                    None => providers.all().await?,
                };

                ctx.output.collection(
                    &found,
                    &["NAME", "PEERING LOCATIONS", "BANDWIDTHS"],
                    |provider| {
                        vec![
                            provider.name.clone(),
                            provider.peering_locations.join(", "),
                            provider
                                .bandwidths_offered
                                .iter()
                                .map(|offer| offer.offer_name.clone())
                                .collect::<Vec<_>>()
                                .join(", "),
                        ]
                    },
                )?;
            }
        }

        Ok(0)
    }
}
