//! Shared test utilities for the azurerm-network test suite.
//!
//! - an [`ArmClient`] and [`AzureNetworkService`] pointed at a `wiremock` server
//! - ARM JSON fixtures for network interfaces, security rules and providers
//! - module parameter helpers
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use azurerm_network::auth::StaticTokenCredential;
use azurerm_network::client::ArmClient;
use azurerm_network::config::{AzureConfig, ClientConfig};
use azurerm_network::modules::ModuleParams;
use azurerm_network::retry::{JitterStrategy, RetryPolicy};
use azurerm_network::service::AzureNetworkService;
use serde_json::{json, Value};
use wiremock::MockServer;

pub const SUBSCRIPTION_ID: &str = "11111111-2222-3333-4444-555555555555";
pub const RESOURCE_GROUP: &str = "test-rg";
pub const TOKEN: &str = "test-token";
pub const API_VERSION: &str = "2023-09-01";

// ============================================================================
// Clients
// ============================================================================

/// Client settings with short poll intervals for tests.
pub fn fast_client_config() -> ClientConfig {
    ClientConfig {
        poll_interval: Duration::from_millis(10),
        retry_delay: Duration::from_millis(1),
        operation_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

/// An ARM client talking to `server`.
pub fn arm_client(server: &MockServer) -> ArmClient {
    let azure = AzureConfig {
        subscription_id: Some(SUBSCRIPTION_ID.to_string()),
        resource_manager_endpoint: Some(server.uri()),
        access_token: Some(TOKEN.to_string()),
        ..Default::default()
    };

    ArmClient::new(
        &azure,
        &fast_client_config(),
        Arc::new(StaticTokenCredential::new(TOKEN)),
    )
    .expect("client")
    .with_retry_policy(
        RetryPolicy::exponential(2, Duration::from_millis(1), Duration::from_millis(5))
            .with_jitter(JitterStrategy::None),
    )
}

/// A real network service talking to `server`.
pub fn network_service(server: &MockServer) -> AzureNetworkService {
    AzureNetworkService::new(arm_client(server), SUBSCRIPTION_ID)
}

// ============================================================================
// Paths and ids
// ============================================================================

pub fn nic_path(name: &str) -> String {
    format!(
        "/subscriptions/{SUBSCRIPTION_ID}/resourceGroups/{RESOURCE_GROUP}/providers/Microsoft.Network/networkInterfaces/{name}"
    )
}

pub fn rule_path(nsg: &str, name: &str) -> String {
    format!(
        "/subscriptions/{SUBSCRIPTION_ID}/resourceGroups/{RESOURCE_GROUP}/providers/Microsoft.Network/networkSecurityGroups/{nsg}/securityRules/{name}"
    )
}

pub fn subnet_id(vnet: &str, subnet: &str) -> String {
    format!(
        "/subscriptions/{SUBSCRIPTION_ID}/resourceGroups/{RESOURCE_GROUP}/providers/Microsoft.Network/virtualNetworks/{vnet}/subnets/{subnet}"
    )
}

pub fn public_ip_id(name: &str) -> String {
    format!(
        "/subscriptions/{SUBSCRIPTION_ID}/resourceGroups/{RESOURCE_GROUP}/providers/Microsoft.Network/publicIPAddresses/{name}"
    )
}

pub fn nsg_id(name: &str) -> String {
    format!(
        "/subscriptions/{SUBSCRIPTION_ID}/resourceGroups/{RESOURCE_GROUP}/providers/Microsoft.Network/networkSecurityGroups/{name}"
    )
}

// ============================================================================
// ARM payloads
// ============================================================================

/// A provisioned NIC as ARM returns it.
pub fn nic_json(name: &str) -> Value {
    json!({
        "id": nic_path(name),
        "name": name,
        "type": "Microsoft.Network/networkInterfaces",
        "location": "westus",
        "etag": "W/\"00000000-0000-0000-0000-000000000001\"",
        "properties": {
            "provisioningState": "Succeeded",
            "macAddress": "00-0D-3A-1B-C7-21",
            "ipConfigurations": [{
                "id": format!("{}/ipConfigurations/ipconfig1", nic_path(name)),
                "name": "ipconfig1",
                "properties": {
                    "provisioningState": "Succeeded",
                    "privateIPAddress": "10.0.0.4",
                    "privateIPAllocationMethod": "Dynamic",
                    "subnet": { "id": subnet_id("vnet", "default") },
                    "primary": true
                }
            }],
            "dnsSettings": {
                "dnsServers": [],
                "appliedDnsServers": [],
                "internalDomainNameSuffix": "test.bx.internal.cloudapp.net"
            },
            "enableAcceleratedNetworking": false,
            "enableIPForwarding": false,
            "primary": true
        }
    })
}

/// A security rule as ARM returns it.
pub fn rule_json(nsg: &str, name: &str, priority: u32) -> Value {
    json!({
        "id": rule_path(nsg, name),
        "name": name,
        "etag": "W/\"00000000-0000-0000-0000-000000000002\"",
        "properties": {
            "provisioningState": "Succeeded",
            "protocol": "Tcp",
            "sourcePortRange": "*",
            "destinationPortRange": "22",
            "sourceAddressPrefix": "*",
            "destinationAddressPrefix": "*",
            "access": "Allow",
            "priority": priority,
            "direction": "Inbound"
        }
    })
}

/// An ExpressRoute provider as ARM returns it.
pub fn provider_json(name: &str) -> Value {
    json!({
        "id": format!("/subscriptions/{SUBSCRIPTION_ID}/providers/Microsoft.Network/expressRouteServiceProviders/{name}"),
        "name": name,
        "type": "Microsoft.Network/expressRouteServiceProviders",
        "properties": {
            "peeringLocations": ["Amsterdam", "Chicago"],
            "bandwidthsOffered": [
                { "offerName": "50Mbps", "valueInMbps": 50 },
                { "offerName": "1Gbps", "valueInMbps": 1000 }
            ],
            "provisioningState": "Succeeded"
        }
    })
}

/// ARM error envelope.
pub fn arm_error(code: &str, message: &str) -> Value {
    json!({ "error": { "code": code, "message": message } })
}

// ============================================================================
// Module parameters
// ============================================================================

/// Build module parameters from `(key, value)` pairs.
pub fn params(pairs: &[(&str, Value)]) -> ModuleParams {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
