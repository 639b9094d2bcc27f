//! ExpressRoute service provider model and collection. Read-only.

use crate::error::Result;
use crate::models::ExpressRouteServiceProviderResource;
use crate::service::NetworkService;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A bandwidth tier offered by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandwidthOffer {
    pub offer_name: String,
    pub value_in_mbps: u32,
}

/// A connectivity provider for ExpressRoute circuits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressRouteServiceProvider {
    pub id: Option<String>,
    pub name: String,
    pub location: Option<String>,
    pub peering_locations: Vec<String>,
    pub bandwidths_offered: Vec<BandwidthOffer>,
    pub provisioning_state: Option<String>,
}

impl ExpressRouteServiceProvider {
    /// Flatten an ARM ExpressRoute service provider.
    pub fn parse(provider: &ExpressRouteServiceProviderResource) -> Self {
        let properties = &provider.properties;
        Self {
            id: provider.id.clone(),
            name: provider.name.clone().unwrap_or_default(),
            location: provider.location.clone(),
            peering_locations: properties.peering_locations.clone(),
            bandwidths_offered: properties
                .bandwidths_offered
                .iter()
                .map(|offer| BandwidthOffer {
                    offer_name: offer.offer_name.clone(),
                    value_in_mbps: offer.value_in_mbps,
                })
                .collect(),
            provisioning_state: properties.provisioning_state.clone(),
        }
    }
}

/// Lookups of ExpressRoute service providers.
#[derive(Clone)]
pub struct ExpressRouteServiceProviders {
    service: Arc<dyn NetworkService>,
}

impl ExpressRouteServiceProviders {
    /// Lookups served by `service`.
    pub fn new(service: Arc<dyn NetworkService>) -> Self {
        Self { service }
    }

    /// Every provider available to the subscription.
    pub async fn all(&self) -> Result<Vec<ExpressRouteServiceProvider>> {
        let providers = self.service.list_express_route_service_providers().await?;
        Ok(providers.iter().map(ExpressRouteServiceProvider::parse).collect())
    }

    /// The provider called `name` (case-insensitive), if any.
    pub async fn get(&self, name: &str) -> Result<Option<ExpressRouteServiceProvider>> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .find(|provider| provider.name.eq_ignore_ascii_case(name)))
    }
}
