//! The request layer: one async method per ARM round trip.
//!
//! [`NetworkService`] is implemented by [`AzureNetworkService`], which talks to
//! Resource Manager, and by [`MockNetworkService`], an in-memory stand-in used
//! for dry runs and tests. Resource models and modules only ever see the
//! trait object.

pub mod mock;
pub mod real;

pub use mock::MockNetworkService;
pub use real::AzureNetworkService;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{
    ExpressRouteServiceProviderResource, IpAllocationMethod, NetworkInterfaceDnsSettings,
    NetworkInterfaceIpConfiguration, NetworkInterfaceResource, SecurityRuleAccess,
    SecurityRuleDirection, SecurityRuleProperties, SecurityRuleProtocol, SecurityRuleResource,
    SubResource,
};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Operations against `Microsoft.Network`.
#[async_trait]
pub trait NetworkService: Send + Sync {
    // ========================================================================
    // Network Interfaces
    // ========================================================================

    /// Create or replace a network interface with a single ip configuration.
    async fn create_or_update_network_interface(
        &self,
        params: &NetworkInterfaceParams,
    ) -> Result<NetworkInterfaceResource>;

    /// Point the NIC (or its first ip configuration) at another resource.
    async fn attach_resource_to_nic(
        &self,
        resource_group: &str,
        name: &str,
        resource: NicResource,
        resource_id: &str,
    ) -> Result<NetworkInterfaceResource>;

    /// Remove the public IP or network security group from the NIC.
    async fn detach_resource_from_nic(
        &self,
        resource_group: &str,
        name: &str,
        resource: NicResource,
    ) -> Result<NetworkInterfaceResource>;

    /// Delete a NIC. Returns `false` when it did not exist.
    async fn delete_network_interface(&self, resource_group: &str, name: &str) -> Result<bool>;

    /// Fetch a NIC.
    async fn get_network_interface(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<NetworkInterfaceResource>;

    /// List the NICs of a resource group.
    async fn list_network_interfaces(
        &self,
        resource_group: &str,
    ) -> Result<Vec<NetworkInterfaceResource>>;

    /// List every NIC in the subscription.
    async fn list_all_network_interfaces(&self) -> Result<Vec<NetworkInterfaceResource>>;

    /// Whether the NIC exists.
    async fn network_interface_exists(&self, resource_group: &str, name: &str) -> Result<bool>;

    // ========================================================================
    // Network Security Rules
    // ========================================================================

    /// Create or replace a security rule.
    async fn create_or_update_network_security_rule(
        &self,
        params: &SecurityRuleParams,
    ) -> Result<SecurityRuleResource>;

    /// Fetch a security rule.
    async fn get_network_security_rule(
        &self,
        resource_group: &str,
        network_security_group_name: &str,
        name: &str,
    ) -> Result<SecurityRuleResource>;

    /// List the rules of a network security group.
    async fn list_network_security_rules(
        &self,
        resource_group: &str,
        network_security_group_name: &str,
    ) -> Result<Vec<SecurityRuleResource>>;

    /// Delete a security rule. Returns `false` when it did not exist.
    async fn delete_network_security_rule(
        &self,
        resource_group: &str,
        network_security_group_name: &str,
        name: &str,
    ) -> Result<bool>;

    /// Whether the security rule exists.
    async fn network_security_rule_exists(
        &self,
        resource_group: &str,
        network_security_group_name: &str,
        name: &str,
    ) -> Result<bool>;

    // ========================================================================
    // ExpressRoute
    // ========================================================================

    /// List the ExpressRoute service providers available to the subscription.
    async fn list_express_route_service_providers(
        &self,
    ) -> Result<Vec<ExpressRouteServiceProviderResource>>;
}

/// Build the service selected by the configuration.
pub fn service_from_config(config: &Config) -> Result<Arc<dyn NetworkService>> {
    if config.azure.mock {
        tracing::debug!("Using in-memory mock network service");
        return Ok(Arc::new(MockNetworkService::new()));
    }

    Ok(Arc::new(AzureNetworkService::from_config(config)?))
}

/// Resource a NIC can be attached to or detached from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NicResource {
    /// Subnet of the first ip configuration
    Subnet,
    /// Public IP of the first ip configuration
    PublicIp,
    /// Network security group of the NIC
    NetworkSecurityGroup,
}

impl fmt::Display for NicResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subnet => write!(f, "Subnet"),
            Self::PublicIp => write!(f, "Public IP"),
            Self::NetworkSecurityGroup => write!(f, "Network Security Group"),
        }
    }
}

/// Set or clear `resource` on a NIC body.
///
/// `resource_id` of `None` detaches. The subnet cannot be detached since an
/// ip configuration without one is invalid.
pub fn apply_nic_resource(
    nic: &mut NetworkInterfaceResource,
    resource: NicResource,
    resource_id: Option<&str>,
) -> Result<()> {
    let reference = resource_id.map(SubResource::new);

    if resource == NicResource::NetworkSecurityGroup {
        nic.properties.network_security_group = reference;
        return Ok(());
    }

    let nic_name = nic.name.clone().unwrap_or_default();
    let ip_configuration = nic.primary_ip_configuration_mut().ok_or_else(|| {
        Error::invalid_attribute(
            "ip_configuration_name",
            format!("Network Interface {nic_name} has no ip configuration"),
        )
    })?;

    match (resource, reference) {
        (NicResource::Subnet, None) => Err(Error::invalid_attribute(
            "subnet_id",
            "Subnet can not be detached from a Network Interface",
        )),
        (NicResource::Subnet, reference) => {
            ip_configuration.properties.subnet = reference;
            Ok(())
        }
        (_, reference) => {
            ip_configuration.properties.public_ip_address = reference;
            Ok(())
        }
    }
}

// ============================================================================
// Request parameters
// ============================================================================

/// Everything needed to create or replace a network interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkInterfaceParams {
    pub resource_group: String,
    pub name: String,
    pub location: String,
    pub subnet_id: String,
    pub public_ip_address_id: Option<String>,
    pub network_security_group_id: Option<String>,
    pub ip_configuration_name: String,
    pub private_ip_allocation_method: IpAllocationMethod,
    pub private_ip_address: Option<String>,
    #[serde(default)]
    pub load_balancer_backend_address_pools_ids: Vec<String>,
    #[serde(default)]
    pub load_balancer_inbound_nat_rules_ids: Vec<String>,
    #[serde(default)]
    pub dns_servers: Vec<String>,
    #[serde(default)]
    pub tags: IndexMap<String, String>,
}

impl NetworkInterfaceParams {
    /// The PUT body for a NIC that does not exist yet.
    pub fn to_resource(&self) -> NetworkInterfaceResource {
        let mut nic = NetworkInterfaceResource::default();
        self.apply_to(&mut nic);
        nic
    }

    /// Overlay these parameters onto a NIC read from Azure.
    ///
    /// A PUT replaces the whole resource, so everything the parameters do not
    /// cover (flags such as `enableIPForwarding`, secondary ip configurations,
    /// unmodelled keys) is left as Azure reported it.
    pub fn apply_to(&self, nic: &mut NetworkInterfaceResource) {
        let private_ip_address = match self.private_ip_allocation_method {
            IpAllocationMethod::Static => self.private_ip_address.clone(),
            IpAllocationMethod::Dynamic => None,
        };

        nic.name = Some(self.name.clone());
        nic.location = Some(self.location.clone());
        nic.tags = (!self.tags.is_empty()).then(|| self.tags.clone());

        let properties = &mut nic.properties;
        properties.network_security_group = self
            .network_security_group_id
            .as_deref()
            .map(SubResource::new);

        match properties.dns_settings.as_mut() {
            Some(dns) => dns.dns_servers = self.dns_servers.clone(),
            None if !self.dns_servers.is_empty() => {
                properties.dns_settings = Some(NetworkInterfaceDnsSettings {
                    dns_servers: self.dns_servers.clone(),
                    ..Default::default()
                });
            }
            None => {}
        }
        // Superseded by dnsSettings once that is sent
        if properties.dns_settings.is_some() {
            properties.dns_servers = None;
        }

        if properties.ip_configurations.is_empty() {
            properties
                .ip_configurations
                .push(NetworkInterfaceIpConfiguration::default());
        }
        let ip_configuration = &mut properties.ip_configurations[0];
        ip_configuration.name = Some(self.ip_configuration_name.clone());

        let ip = &mut ip_configuration.properties;
        ip.subnet = Some(SubResource::new(&self.subnet_id));
        ip.private_ip_allocation_method = Some(self.private_ip_allocation_method);
        ip.private_ip_address = private_ip_address;
        ip.public_ip_address = self.public_ip_address_id.as_deref().map(SubResource::new);
        ip.load_balancer_backend_address_pools = self
            .load_balancer_backend_address_pools_ids
            .iter()
            .map(SubResource::new)
            .collect();
        ip.load_balancer_inbound_nat_rules = self
            .load_balancer_inbound_nat_rules_ids
            .iter()
            .map(SubResource::new)
            .collect();
    }
}

/// Everything needed to create or replace a security rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityRuleParams {
    pub name: String,
    pub resource_group: String,
    pub network_security_group_name: String,
    pub description: Option<String>,
    pub protocol: SecurityRuleProtocol,
    pub source_port_range: String,
    pub destination_port_range: String,
    pub source_address_prefix: String,
    pub destination_address_prefix: String,
    pub access: SecurityRuleAccess,
    pub priority: u32,
    pub direction: SecurityRuleDirection,
}

impl SecurityRuleParams {
    /// The PUT body for these parameters.
    pub fn to_resource(&self) -> SecurityRuleResource {
        SecurityRuleResource {
            name: Some(self.name.clone()),
            properties: SecurityRuleProperties {
                description: self.description.clone(),
                protocol: Some(self.protocol),
                source_port_range: Some(self.source_port_range.clone()),
                destination_port_range: Some(self.destination_port_range.clone()),
                source_address_prefix: Some(self.source_address_prefix.clone()),
                destination_address_prefix: Some(self.destination_address_prefix.clone()),
                access: Some(self.access),
                priority: Some(self.priority),
                direction: Some(self.direction),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

// ============================================================================
// Log and error context
// ============================================================================

pub(crate) fn nic_write_context(name: &str, resource_group: &str) -> String {
    format!("Creating/Updating Network Interface {name} in Resource Group {resource_group}.")
}

pub(crate) fn rule_write_context(name: &str, resource_group: &str) -> String {
    format!("Creating/Updating Network Security Rule {name} in Resource Group {resource_group}.")
}
