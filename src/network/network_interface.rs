//! Network interface model and collection.

use super::merge_json_attributes;
use crate::error::{Error, Result};
use crate::models::{IpAllocationMethod, NetworkInterfaceResource};
use crate::resource_id::resource_group_from_id;
use crate::service::{NetworkInterfaceParams, NetworkService, NicResource};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Attributes fixed once a NIC exists.
pub const RESTRICTED_ATTRIBUTES: [&str; 6] = [
    "name",
    "id",
    "resource_group",
    "location",
    "ip_configuration_name",
    "ip_configuration_id",
];

/// A network interface as a flat set of attributes.
///
/// Only the first ip configuration of the NIC is represented.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkInterface {
    pub name: String,
    pub id: Option<String>,
    pub location: Option<String>,
    pub resource_group: Option<String>,
    pub virtual_machine_id: Option<String>,
    pub mac_address: Option<String>,
    pub network_security_group_id: Option<String>,
    pub ip_configuration_name: Option<String>,
    pub ip_configuration_id: Option<String>,
    pub subnet_id: Option<String>,
    pub private_ip_allocation_method: Option<IpAllocationMethod>,
    pub private_ip_address: Option<String>,
    pub public_ip_address_id: Option<String>,
    pub load_balancer_backend_address_pools_ids: Vec<String>,
    pub load_balancer_inbound_nat_rules_ids: Vec<String>,
    pub dns_servers: Vec<String>,
    pub applied_dns_servers: Vec<String>,
    pub internal_dns_name_label: Option<String>,
    pub internal_fqdn: Option<String>,
    pub tags: IndexMap<String, String>,
}

impl NetworkInterface {
    /// A new, unsaved NIC called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Flatten an ARM network interface.
    pub fn parse(nic: &NetworkInterfaceResource) -> Self {
        let properties = &nic.properties;
        let id = nic.id.clone();

        let mut parsed = Self {
            name: nic.name.clone().unwrap_or_default(),
            resource_group: id.as_deref().and_then(resource_group_from_id),
            id,
            location: nic.location.clone(),
            virtual_machine_id: properties
                .virtual_machine
                .as_ref()
                .and_then(|vm| vm.id.clone()),
            mac_address: properties.mac_address.clone(),
            network_security_group_id: properties
                .network_security_group
                .as_ref()
                .and_then(|nsg| nsg.id.clone()),
            tags: nic.tags.clone().unwrap_or_default(),
            ..Default::default()
        };

        if let Some(ip_configuration) = nic.primary_ip_configuration() {
            let ip = &ip_configuration.properties;
            parsed.ip_configuration_name = ip_configuration.name.clone();
            parsed.ip_configuration_id = ip_configuration.id.clone();
            parsed.subnet_id = ip.subnet.as_ref().and_then(|s| s.id.clone());
            parsed.private_ip_allocation_method = ip.private_ip_allocation_method;
            parsed.private_ip_address = ip.private_ip_address.clone();
            parsed.public_ip_address_id = ip.public_ip_address.as_ref().and_then(|p| p.id.clone());
            parsed.load_balancer_backend_address_pools_ids = ip
                .load_balancer_backend_address_pools
                .iter()
                .filter_map(|pool| pool.id.clone())
                .collect();
            parsed.load_balancer_inbound_nat_rules_ids = ip
                .load_balancer_inbound_nat_rules
                .iter()
                .filter_map(|rule| rule.id.clone())
                .collect();
        }

        match &properties.dns_settings {
            Some(dns) => {
                parsed.dns_servers = dns.dns_servers.clone();
                parsed.applied_dns_servers = dns.applied_dns_servers.clone();
                parsed.internal_dns_name_label = dns.internal_dns_name_label.clone();
                parsed.internal_fqdn = dns.internal_fqdn.clone();
            }
            None => {
                parsed.dns_servers = properties.dns_servers.clone().unwrap_or_default();
                parsed.applied_dns_servers =
                    properties.applied_dns_servers.clone().unwrap_or_default();
                parsed.internal_dns_name_label = properties.internal_dns_name_label.clone();
                parsed.internal_fqdn = properties.internal_fqdn.clone();
            }
        }

        parsed
    }

    /// Create or replace the NIC in Azure.
    pub async fn save(&mut self, service: &dyn NetworkService) -> Result<()> {
        let params = self.to_params()?;
        let nic = service.create_or_update_network_interface(&params).await?;
        *self = Self::parse(&nic);
        Ok(())
    }

    /// Change mutable attributes and push the NIC to Azure.
    pub async fn update(
        &mut self,
        service: &dyn NetworkService,
        attributes: &Map<String, Value>,
    ) -> Result<()> {
        validate_update_attributes(attributes)?;
        self.merge_attributes(attributes)?;
        self.save(service).await
    }

    /// Point the ip configuration at another subnet.
    pub async fn attach_subnet(&mut self, service: &dyn NetworkService, subnet_id: &str) -> Result<()> {
        if subnet_id.is_empty() {
            return Err(Error::invalid_attribute("subnet_id", "Subnet ID can not be nil."));
        }
        self.attach(service, NicResource::Subnet, subnet_id).await
    }

    /// Associate a public IP with the ip configuration.
    pub async fn attach_public_ip(
        &mut self,
        service: &dyn NetworkService,
        public_ip_id: &str,
    ) -> Result<()> {
        if public_ip_id.is_empty() {
            return Err(Error::invalid_attribute(
                "public_ip_address_id",
                "Public-IP ID can not be nil.",
            ));
        }
        self.attach(service, NicResource::PublicIp, public_ip_id).await
    }

    /// Associate a network security group with the NIC.
    pub async fn attach_network_security_group(
        &mut self,
        service: &dyn NetworkService,
        network_security_group_id: &str,
    ) -> Result<()> {
        if network_security_group_id.is_empty() {
            return Err(Error::invalid_attribute(
                "network_security_group_id",
                "Network-Security-Group ID can not be nil.",
            ));
        }
        self.attach(
            service,
            NicResource::NetworkSecurityGroup,
            network_security_group_id,
        )
        .await
    }

    /// Remove the public IP from the ip configuration.
    pub async fn detach_public_ip(&mut self, service: &dyn NetworkService) -> Result<()> {
        if self.public_ip_address_id.is_none() {
            return Err(Error::InvalidState(format!(
                "Error detaching Public IP. No Public IP is attached to Network Interface {}",
                self.name
            )));
        }
        self.detach(service, NicResource::PublicIp).await
    }

    /// Remove the network security group from the NIC.
    pub async fn detach_network_security_group(&mut self, service: &dyn NetworkService) -> Result<()> {
        if self.network_security_group_id.is_none() {
            return Err(Error::InvalidState(format!(
                "Error detaching Network Security Group. No Security Group is attached to Network Interface {}",
                self.name
            )));
        }
        self.detach(service, NicResource::NetworkSecurityGroup).await
    }

    /// Delete the NIC. Returns `false` when it did not exist.
    pub async fn destroy(&self, service: &dyn NetworkService) -> Result<bool> {
        let resource_group = self.require_resource_group()?;
        service.delete_network_interface(resource_group, &self.name).await
    }

    /// Overwrite attributes from a `name -> value` map.
    pub fn merge_attributes(&mut self, attributes: &Map<String, Value>) -> Result<()> {
        let mut normalized = attributes.clone();
        if let Some(Value::String(method)) = normalized.get("private_ip_allocation_method") {
            let method: IpAllocationMethod = method.parse()?;
            normalized.insert(
                "private_ip_allocation_method".to_string(),
                Value::String(method.as_str().to_string()),
            );
        }
        *self = merge_json_attributes(&*self, &normalized)?;
        Ok(())
    }

    /// Request parameters for a create or update.
    pub fn to_params(&self) -> Result<NetworkInterfaceParams> {
        if self.name.is_empty() {
            return Err(Error::MissingAttribute("name".to_string()));
        }
        let location = required(&self.location, "location")?;
        let resource_group = self.require_resource_group()?;
        let subnet_id = required(&self.subnet_id, "subnet_id")?;
        let ip_configuration_name = required(&self.ip_configuration_name, "ip_configuration_name")?;
        let private_ip_allocation_method = self
            .private_ip_allocation_method
            .ok_or_else(|| Error::MissingAttribute("private_ip_allocation_method".to_string()))?;

        Ok(NetworkInterfaceParams {
            resource_group: resource_group.to_string(),
            name: self.name.clone(),
            location: location.to_string(),
            subnet_id: subnet_id.to_string(),
            public_ip_address_id: self.public_ip_address_id.clone(),
            network_security_group_id: self.network_security_group_id.clone(),
            ip_configuration_name: ip_configuration_name.to_string(),
            private_ip_allocation_method,
            private_ip_address: self.private_ip_address.clone(),
            load_balancer_backend_address_pools_ids: self
                .load_balancer_backend_address_pools_ids
                .clone(),
            load_balancer_inbound_nat_rules_ids: self.load_balancer_inbound_nat_rules_ids.clone(),
            dns_servers: self.dns_servers.clone(),
            tags: self.tags.clone(),
        })
    }

    async fn attach(
        &mut self,
        service: &dyn NetworkService,
        resource: NicResource,
        resource_id: &str,
    ) -> Result<()> {
        let resource_group = self.require_resource_group()?;
        let nic = service
            .attach_resource_to_nic(resource_group, &self.name, resource, resource_id)
            .await?;
        *self = Self::parse(&nic);
        Ok(())
    }

    async fn detach(&mut self, service: &dyn NetworkService, resource: NicResource) -> Result<()> {
        let resource_group = self.require_resource_group()?;
        let nic = service
            .detach_resource_from_nic(resource_group, &self.name, resource)
            .await?;
        *self = Self::parse(&nic);
        Ok(())
    }

    fn require_resource_group(&self) -> Result<&str> {
        required(&self.resource_group, "resource_group")
    }
}

fn required<'a>(value: &'a Option<String>, attribute: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::MissingAttribute(attribute.to_string()))
}

/// Reject attributes that can not change after creation.
pub fn validate_update_attributes(attributes: &Map<String, Value>) -> Result<()> {
    let invalid: Vec<String> = RESTRICTED_ATTRIBUTES
        .iter()
        .filter(|attribute| attributes.contains_key(**attribute))
        .map(|attribute| attribute.to_string())
        .collect();

    if invalid.is_empty() {
        Ok(())
    } else {
        Err(Error::RestrictedAttributes(invalid))
    }
}

/// Lookups of network interfaces.
#[derive(Clone)]
pub struct NetworkInterfaces {
    service: Arc<dyn NetworkService>,
}

impl NetworkInterfaces {
    /// Collection over `service`.
    pub fn new(service: Arc<dyn NetworkService>) -> Self {
        Self { service }
    }

    /// Every NIC in a resource group.
    pub async fn all(&self, resource_group: &str) -> Result<Vec<NetworkInterface>> {
        let nics = self.service.list_network_interfaces(resource_group).await?;
        Ok(nics.iter().map(NetworkInterface::parse).collect())
    }

    /// Every NIC in the subscription.
    pub async fn all_in_subscription(&self) -> Result<Vec<NetworkInterface>> {
        let nics = self.service.list_all_network_interfaces().await?;
        Ok(nics.iter().map(NetworkInterface::parse).collect())
    }

    /// One NIC.
    pub async fn get(&self, resource_group: &str, name: &str) -> Result<NetworkInterface> {
        let nic = self.service.get_network_interface(resource_group, name).await?;
        Ok(NetworkInterface::parse(&nic))
    }

    /// Whether the NIC exists.
    pub async fn exists(&self, resource_group: &str, name: &str) -> Result<bool> {
        self.service.network_interface_exists(resource_group, name).await
    }
}
