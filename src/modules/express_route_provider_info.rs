//! ExpressRoute service provider info module
//!
//! Read-only: reports the providers available to the subscription.
//!
//! ## Parameters
//!
//! - `name`: Only report the provider with this name

use super::{Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleResult, ParamExt};
use crate::network::ExpressRouteServiceProviders;
use async_trait::async_trait;
use serde_json::json;

/// Module for querying ExpressRoute service providers
pub struct AzureExpressRouteProviderInfoModule;

#[async_trait]
impl Module for AzureExpressRouteProviderInfoModule {
    fn name(&self) -> &'static str {
        "azure_express_route_provider_info"
    }

    fn description(&self) -> &'static str {
        "Query Azure ExpressRoute service providers"
    }

    async fn execute(
        &self,
        params: &ModuleParams,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let providers = ExpressRouteServiceProviders::new(context.service.clone());

        let found = match params.get_string("name")? {
            Some(name) => providers.get(&name).await?.into_iter().collect(),
            None => providers.all().await?,
        };

        let data =
            serde_json::to_value(&found).map_err(|e| ModuleError::ExecutionFailed(e.to_string()))?;
        Ok(
            ModuleOutput::ok(format!("Found {} ExpressRoute service provider(s)", found.len()))
                .with_data("providers", data)
                .with_data("count", json!(found.len())),
        )
    }
}
