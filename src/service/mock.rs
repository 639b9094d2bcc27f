//! In-memory [`NetworkService`].
//!
//! Seeded with one network interface, one security rule and one ExpressRoute
//! service provider. Writes are kept in memory for the lifetime of the
//! service; ids are synthesised under [`MOCK_SUBSCRIPTION_ID`].

use super::{
    apply_nic_resource, nic_write_context, rule_write_context, NetworkInterfaceParams,
    NetworkService, NicResource, SecurityRuleParams,
};
use crate::error::{Error, Result};
use crate::models::{
    ExpressRouteServiceProviderBandwidthsOffered, ExpressRouteServiceProviderProperties,
    ExpressRouteServiceProviderResource, IpAllocationMethod, NetworkInterfaceResource,
    SecurityRuleAccess, SecurityRuleDirection, SecurityRuleProtocol, SecurityRuleResource,
};
use crate::resource_id::{ResourceId, NETWORK_PROVIDER};
use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Subscription every mock resource lives in.
pub const MOCK_SUBSCRIPTION_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Resource group of the seeded resources.
pub const MOCK_RESOURCE_GROUP: &str = "fog-test-rg";

/// Name of the seeded network interface.
pub const MOCK_NETWORK_INTERFACE: &str = "fog-test-network-interface";

/// Network security group holding the seeded rule.
pub const MOCK_NETWORK_SECURITY_GROUP: &str = "fog-test-nsg";

/// Name of the seeded security rule.
pub const MOCK_SECURITY_RULE: &str = "fog-test-nsr";

#[derive(Debug, Default)]
struct MockState {
    network_interfaces: IndexMap<String, NetworkInterfaceResource>,
    security_rules: IndexMap<String, SecurityRuleResource>,
    express_route_providers: Vec<ExpressRouteServiceProviderResource>,
    next_address: u8,
}

/// Network service that never leaves the process.
#[derive(Debug)]
pub struct MockNetworkService {
    state: RwLock<MockState>,
}

impl Default for MockNetworkService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNetworkService {
    /// A mock seeded with the fixture resources.
    pub fn new() -> Self {
        let service = Self::empty();
        service.seed();
        service
    }

    /// A mock without any resources.
    pub fn empty() -> Self {
        Self {
            state: RwLock::new(MockState {
                next_address: 4,
                ..MockState::default()
            }),
        }
    }

    fn seed(&self) {
        let subnet_id = format!(
            "/subscriptions/{MOCK_SUBSCRIPTION_ID}/resourceGroups/{MOCK_RESOURCE_GROUP}/providers/{NETWORK_PROVIDER}/virtualNetworks/fog-test-vnet/subnets/fog-test-subnet"
        );
        let nic = NetworkInterfaceParams {
            resource_group: MOCK_RESOURCE_GROUP.to_string(),
            name: MOCK_NETWORK_INTERFACE.to_string(),
            location: "westus".to_string(),
            subnet_id,
            public_ip_address_id: None,
            network_security_group_id: None,
            ip_configuration_name: "fog-test-ip-configuration".to_string(),
            private_ip_allocation_method: IpAllocationMethod::Dynamic,
            private_ip_address: None,
            load_balancer_backend_address_pools_ids: Vec::new(),
            load_balancer_inbound_nat_rules_ids: Vec::new(),
            dns_servers: Vec::new(),
            tags: IndexMap::new(),
        };
        self.store_nic(&nic.resource_group, &nic.name, nic.to_resource());

        let rule = SecurityRuleParams {
            name: MOCK_SECURITY_RULE.to_string(),
            resource_group: MOCK_RESOURCE_GROUP.to_string(),
            network_security_group_name: MOCK_NETWORK_SECURITY_GROUP.to_string(),
            description: None,
            protocol: SecurityRuleProtocol::Tcp,
            source_port_range: "22".to_string(),
            destination_port_range: "22".to_string(),
            source_address_prefix: "0.0.0.0/0".to_string(),
            destination_address_prefix: "0.0.0.0/0".to_string(),
            access: SecurityRuleAccess::Allow,
            priority: 100,
            direction: SecurityRuleDirection::Inbound,
        };
        self.store_rule(&rule);

        self.state.write().express_route_providers = vec![ExpressRouteServiceProviderResource {
            id: Some(
                ResourceId::express_route_service_provider(MOCK_SUBSCRIPTION_ID, "providername")
                    .to_string(),
            ),
            name: Some("providername".to_string()),
            resource_type: Some(format!("{NETWORK_PROVIDER}/expressRouteServiceProviders")),
            location: None,
            properties: ExpressRouteServiceProviderProperties {
                peering_locations: vec!["location1".to_string(), "location2".to_string()],
                bandwidths_offered: vec![ExpressRouteServiceProviderBandwidthsOffered {
                    offer_name: "100Mbps".to_string(),
                    value_in_mbps: 100,
                }],
                provisioning_state: Some("Succeeded".to_string()),
            },
        }];
    }

    /// Fill in the server-assigned fields and store the NIC.
    fn store_nic(
        &self,
        resource_group: &str,
        name: &str,
        mut nic: NetworkInterfaceResource,
    ) -> NetworkInterfaceResource {
        let mut state = self.state.write();
        let key = nic_key(resource_group, name);
        let existing = state.network_interfaces.get(&key).cloned();

        let nic_id = ResourceId::network_interface(MOCK_SUBSCRIPTION_ID, resource_group, name);
        nic.id = Some(nic_id.to_string());
        nic.name = Some(name.to_string());
        nic.resource_type = Some(format!("{NETWORK_PROVIDER}/networkInterfaces"));
        nic.etag = Some(format!("W/\"{}\"", Uuid::new_v4()));

        let properties = &mut nic.properties;
        properties.provisioning_state = Some("Succeeded".to_string());
        if let Some(existing) = &existing {
            if properties.virtual_machine.is_none() {
                properties.virtual_machine = existing.properties.virtual_machine.clone();
            }
            if properties.mac_address.is_none() {
                properties.mac_address = existing.properties.mac_address.clone();
            }
        }
        if let Some(dns) = properties.dns_settings.as_mut() {
            dns.applied_dns_servers = dns.dns_servers.clone();
        }

        for (index, ip_configuration) in properties.ip_configurations.iter_mut().enumerate() {
            let ip_name = ip_configuration
                .name
                .clone()
                .unwrap_or_else(|| format!("ipconfig{}", index + 1));
            ip_configuration.id = Some(
                ResourceId::ip_configuration(MOCK_SUBSCRIPTION_ID, resource_group, name, &ip_name)
                    .to_string(),
            );
            ip_configuration.name = Some(ip_name);

            let ip = &mut ip_configuration.properties;
            ip.provisioning_state = Some("Succeeded".to_string());
            ip.primary = Some(index == 0);
            if ip.private_ip_address.is_none() {
                let previous = existing
                    .as_ref()
                    .and_then(|e| e.properties.ip_configurations.get(index))
                    .and_then(|c| c.properties.private_ip_address.clone());
                ip.private_ip_address = Some(previous.unwrap_or_else(|| {
                    let octet = state.next_address;
                    state.next_address = state.next_address.wrapping_add(1).max(4);
                    format!("10.0.0.{octet}")
                }));
            }
        }

        state.network_interfaces.insert(key, nic.clone());
        nic
    }

    fn store_rule(&self, params: &SecurityRuleParams) -> SecurityRuleResource {
        let mut rule = params.to_resource();
        rule.id = Some(
            ResourceId::security_rule(
                MOCK_SUBSCRIPTION_ID,
                &params.resource_group,
                &params.network_security_group_name,
                &params.name,
            )
            .to_string(),
        );
        rule.resource_type = Some(format!(
            "{NETWORK_PROVIDER}/networkSecurityGroups/securityRules"
        ));
        rule.etag = Some(format!("W/\"{}\"", Uuid::new_v4()));
        rule.properties.provisioning_state = Some("Succeeded".to_string());

        self.state.write().security_rules.insert(
            rule_key(
                &params.resource_group,
                &params.network_security_group_name,
                &params.name,
            ),
            rule.clone(),
        );
        rule
    }

    fn find_nic(&self, resource_group: &str, name: &str) -> Option<NetworkInterfaceResource> {
        self.state
            .read()
            .network_interfaces
            .get(&nic_key(resource_group, name))
            .cloned()
    }

    fn find_rule(&self, resource_group: &str, nsg: &str, name: &str) -> Option<SecurityRuleResource> {
        self.state
            .read()
            .security_rules
            .get(&rule_key(resource_group, nsg, name))
            .cloned()
    }

    fn update_nic(
        &self,
        resource_group: &str,
        name: &str,
        resource: NicResource,
        resource_id: Option<&str>,
        msg: &str,
    ) -> Result<NetworkInterfaceResource> {
        let mut nic = self
            .find_nic(resource_group, name)
            .ok_or_else(|| not_found(msg, "networkInterfaces", name, resource_group))?;
        apply_nic_resource(&mut nic, resource, resource_id)?;
        Ok(self.store_nic(resource_group, name, nic))
    }
}

fn nic_key(resource_group: &str, name: &str) -> String {
    format!("{resource_group}/{name}").to_lowercase()
}

fn rule_key(resource_group: &str, nsg: &str, name: &str) -> String {
    format!("{resource_group}/{nsg}/{name}").to_lowercase()
}

fn not_found(context: &str, resource_type: &str, name: &str, resource_group: &str) -> Error {
    Error::Azure {
        context: context.to_string(),
        status: Some(404),
        code: "ResourceNotFound".to_string(),
        message: format!(
            "The Resource '{NETWORK_PROVIDER}/{resource_type}/{name}' under resource group '{resource_group}' was not found."
        ),
    }
}

#[async_trait]
impl NetworkService for MockNetworkService {
    async fn create_or_update_network_interface(
        &self,
        params: &NetworkInterfaceParams,
    ) -> Result<NetworkInterfaceResource> {
        debug!("{}", nic_write_context(&params.name, &params.resource_group));
        let mut nic = self
            .find_nic(&params.resource_group, &params.name)
            .unwrap_or_default();
        params.apply_to(&mut nic);
        let nic = self.store_nic(&params.resource_group, &params.name, nic);
        debug!("Network Interface {} Created/Updated Successfully!", params.name);
        Ok(nic)
    }

    async fn attach_resource_to_nic(
        &self,
        resource_group: &str,
        name: &str,
        resource: NicResource,
        resource_id: &str,
    ) -> Result<NetworkInterfaceResource> {
        let msg = format!(
            "Attaching {resource} {resource_id} to Network Interface {name} in Resource Group {resource_group}."
        );
        debug!("{msg}");
        self.update_nic(resource_group, name, resource, Some(resource_id), &msg)
    }

    async fn detach_resource_from_nic(
        &self,
        resource_group: &str,
        name: &str,
        resource: NicResource,
    ) -> Result<NetworkInterfaceResource> {
        let msg = format!(
            "Detaching {resource} from Network Interface {name} in Resource Group {resource_group}."
        );
        debug!("{msg}");
        self.update_nic(resource_group, name, resource, None, &msg)
    }

    async fn delete_network_interface(&self, resource_group: &str, name: &str) -> Result<bool> {
        debug!("Deleting Network Interface {name} from Resource Group {resource_group}.");
        Ok(self
            .state
            .write()
            .network_interfaces
            .shift_remove(&nic_key(resource_group, name))
            .is_some())
    }

    async fn get_network_interface(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<NetworkInterfaceResource> {
        let msg = format!("Getting Network Interface {name} from Resource Group {resource_group}.");
        debug!("{msg}");
        self.find_nic(resource_group, name)
            .ok_or_else(|| not_found(&msg, "networkInterfaces", name, resource_group))
    }

    async fn list_network_interfaces(
        &self,
        resource_group: &str,
    ) -> Result<Vec<NetworkInterfaceResource>> {
        let prefix = format!("{}/", resource_group.to_lowercase());
        Ok(self
            .state
            .read()
            .network_interfaces
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, nic)| nic.clone())
            .collect())
    }

    async fn list_all_network_interfaces(&self) -> Result<Vec<NetworkInterfaceResource>> {
        Ok(self.state.read().network_interfaces.values().cloned().collect())
    }

    async fn network_interface_exists(&self, resource_group: &str, name: &str) -> Result<bool> {
        Ok(self.find_nic(resource_group, name).is_some())
    }

    async fn create_or_update_network_security_rule(
        &self,
        params: &SecurityRuleParams,
    ) -> Result<SecurityRuleResource> {
        debug!("{}", rule_write_context(&params.name, &params.resource_group));
        let rule = self.store_rule(params);
        debug!(
            "Network Security Rule {} Created/Updated Successfully!",
            params.name
        );
        Ok(rule)
    }

    async fn get_network_security_rule(
        &self,
        resource_group: &str,
        network_security_group_name: &str,
        name: &str,
    ) -> Result<SecurityRuleResource> {
        let msg = format!(
            "Getting Network Security Rule {name} of Network Security Group {network_security_group_name} from Resource Group {resource_group}."
        );
        debug!("{msg}");
        self.find_rule(resource_group, network_security_group_name, name)
            .ok_or_else(|| {
                not_found(
                    &msg,
                    &format!("networkSecurityGroups/{network_security_group_name}/securityRules"),
                    name,
                    resource_group,
                )
            })
    }

    async fn list_network_security_rules(
        &self,
        resource_group: &str,
        network_security_group_name: &str,
    ) -> Result<Vec<SecurityRuleResource>> {
        let prefix = format!("{resource_group}/{network_security_group_name}/").to_lowercase();
        Ok(self
            .state
            .read()
            .security_rules
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, rule)| rule.clone())
            .collect())
    }

    async fn delete_network_security_rule(
        &self,
        resource_group: &str,
        network_security_group_name: &str,
        name: &str,
    ) -> Result<bool> {
        debug!("Deleting Network Security Rule {name} from Resource Group {resource_group}.");
        Ok(self
            .state
            .write()
            .security_rules
            .shift_remove(&rule_key(resource_group, network_security_group_name, name))
            .is_some())
    }

    async fn network_security_rule_exists(
        &self,
        resource_group: &str,
        network_security_group_name: &str,
        name: &str,
    ) -> Result<bool> {
        Ok(self
            .find_rule(resource_group, network_security_group_name, name)
            .is_some())
    }

    async fn list_express_route_service_providers(
        &self,
    ) -> Result<Vec<ExpressRouteServiceProviderResource>> {
        debug!("Getting list of Express Route Service Providers.");
        Ok(self.state.read().express_route_providers.clone())
    }
}
