//! `Microsoft.Network/expressRouteServiceProviders` payloads.

use serde::{Deserialize, Serialize};

/// An ExpressRoute service provider as returned by ARM.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressRouteServiceProviderResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub properties: ExpressRouteServiceProviderProperties,
}

/// `properties` of an ExpressRoute service provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressRouteServiceProviderProperties {
    #[serde(default)]
    pub peering_locations: Vec<String>,
    #[serde(default)]
    pub bandwidths_offered: Vec<ExpressRouteServiceProviderBandwidthsOffered>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

/// A bandwidth tier offered by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressRouteServiceProviderBandwidthsOffered {
    #[serde(default)]
    pub offer_name: String,
    #[serde(default)]
    pub value_in_mbps: u32,
}
