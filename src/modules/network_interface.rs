//! Azure network interface module
//!
//! Converges a NIC towards the requested subnet, public IP, network security
//! group, private address and DNS settings.
//!
//! ## Parameters
//!
//! - `name` (required): NIC name
//! - `resource_group` (required): Resource group
//! - `location`: Azure region (required to create)
//! - `subnet_id`: Subnet of the ip configuration (required to create)
//! - `public_ip_address_id`: Public IP to attach, empty or null to detach
//! - `network_security_group_id`: NSG to attach, empty or null to detach
//! - `ip_configuration_name`: Name of the ip configuration (default `ipconfig1`)
//! - `private_ip_allocation_method`: `Dynamic` or `Static`
//! - `private_ip_address`: Static private address (implies `Static`)
//! - `dns_servers`: DNS servers, list or comma-separated
//! - `tags`: Mapping of tag names to values
//! - `state`: `present` (default) or `absent`

use super::{
    desired_state, tags_param, DesiredState, Diff, Module, ModuleContext, ModuleError,
    ModuleOutput, ModuleParams, ModuleResult, ParamExt,
};
use crate::models::IpAllocationMethod;
use crate::network::{NetworkInterface, NetworkInterfaces};
use crate::service::NicResource;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{json, Map, Value};

const DEFAULT_IP_CONFIGURATION_NAME: &str = "ipconfig1";

/// Requested state of an optional resource reference
#[derive(Debug, Clone, PartialEq, Eq)]
enum Reference {
    /// Leave whatever is attached
    Unspecified,
    /// Nothing should be attached
    Detached,
    /// This resource should be attached
    Attached(String),
}

impl Reference {
    fn from_params(params: &ModuleParams, key: &str) -> ModuleResult<Self> {
        match params.get(key) {
            None => Ok(Self::Unspecified),
            Some(Value::Null) => Ok(Self::Detached),
            Some(_) => match params.get_string(key)? {
                Some(id) if !id.trim().is_empty() => Ok(Self::Attached(id)),
                _ => Ok(Self::Detached),
            },
        }
    }

    fn apply(&self, current: &mut Option<String>) {
        match self {
            Self::Unspecified => {}
            Self::Detached => *current = None,
            Self::Attached(id) => *current = Some(id.clone()),
        }
    }
}

/// NIC module configuration
#[derive(Debug, Clone)]
struct NicModuleConfig {
    name: String,
    resource_group: String,
    location: Option<String>,
    subnet_id: Option<String>,
    public_ip: Reference,
    network_security_group: Reference,
    ip_configuration_name: String,
    private_ip_allocation_method: Option<IpAllocationMethod>,
    private_ip_address: Option<String>,
    dns_servers: Option<Vec<String>>,
    tags: Option<IndexMap<String, String>>,
    state: DesiredState,
}

impl NicModuleConfig {
    fn from_params(params: &ModuleParams) -> ModuleResult<Self> {
        let private_ip_allocation_method = params
            .get_string("private_ip_allocation_method")?
            .map(|method| method.parse::<IpAllocationMethod>())
            .transpose()?;

        Ok(Self {
            name: params.get_string_required("name")?,
            resource_group: params.get_string_required("resource_group")?,
            location: params.get_string("location")?,
            subnet_id: params.get_string("subnet_id")?.filter(|s| !s.is_empty()),
            public_ip: Reference::from_params(params, "public_ip_address_id")?,
            network_security_group: Reference::from_params(params, "network_security_group_id")?,
            ip_configuration_name: params
                .get_string("ip_configuration_name")?
                .unwrap_or_else(|| DEFAULT_IP_CONFIGURATION_NAME.to_string()),
            private_ip_allocation_method,
            private_ip_address: params
                .get_string("private_ip_address")?
                .filter(|s| !s.is_empty()),
            dns_servers: params.get_vec_string("dns_servers")?,
            tags: tags_param(params)?,
            state: desired_state(params)?,
        })
    }

    /// The allocation method to request, given what is currently set.
    fn allocation_method(&self, current: Option<IpAllocationMethod>) -> Option<IpAllocationMethod> {
        match (self.private_ip_allocation_method, &self.private_ip_address) {
            (Some(method), _) => Some(method),
            (None, Some(_)) => Some(IpAllocationMethod::Static),
            (None, None) => current,
        }
    }

    /// Overlay the requested attributes on `nic`.
    fn apply_to(&self, nic: &mut NetworkInterface) {
        if let Some(subnet_id) = &self.subnet_id {
            nic.subnet_id = Some(subnet_id.clone());
        }
        self.public_ip.apply(&mut nic.public_ip_address_id);
        self.network_security_group
            .apply(&mut nic.network_security_group_id);

        nic.private_ip_allocation_method = self.allocation_method(nic.private_ip_allocation_method);
        if let Some(address) = &self.private_ip_address {
            nic.private_ip_address = Some(address.clone());
        }
        if let Some(dns_servers) = &self.dns_servers {
            nic.dns_servers = dns_servers.clone();
        }
        if let Some(tags) = &self.tags {
            nic.tags = tags.clone();
        }
    }

    /// A NIC built from scratch for creation.
    fn to_new_interface(&self) -> ModuleResult<NetworkInterface> {
        let location = self
            .location
            .clone()
            .ok_or_else(|| ModuleError::MissingParameter("location".to_string()))?;
        if self.subnet_id.is_none() {
            return Err(ModuleError::MissingParameter("subnet_id".to_string()));
        }

        let mut nic = NetworkInterface::new(&self.name);
        nic.resource_group = Some(self.resource_group.clone());
        nic.location = Some(location);
        nic.ip_configuration_name = Some(self.ip_configuration_name.clone());
        self.apply_to(&mut nic);
        if nic.private_ip_allocation_method.is_none() {
            nic.private_ip_allocation_method = Some(IpAllocationMethod::Dynamic);
        }
        Ok(nic)
    }
}

/// Attributes that go through a full update rather than attach/detach.
const PROPERTY_FIELDS: [&str; 4] = [
    "private_ip_allocation_method",
    "private_ip_address",
    "dns_servers",
    "tags",
];

/// Names of the attributes that differ between `current` and `desired`.
fn changed_fields(current: &NetworkInterface, desired: &NetworkInterface) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if !same_id(&current.subnet_id, &desired.subnet_id) {
        changed.push("subnet_id");
    }
    if !same_id(&current.public_ip_address_id, &desired.public_ip_address_id) {
        changed.push("public_ip_address_id");
    }
    if !same_id(
        &current.network_security_group_id,
        &desired.network_security_group_id,
    ) {
        changed.push("network_security_group_id");
    }
    if current.private_ip_allocation_method != desired.private_ip_allocation_method {
        changed.push("private_ip_allocation_method");
    }
    if current.private_ip_address != desired.private_ip_address {
        changed.push("private_ip_address");
    }
    if current.dns_servers != desired.dns_servers {
        changed.push("dns_servers");
    }
    if current.tags != desired.tags {
        changed.push("tags");
    }
    changed
}

/// Resource ids compare case-insensitively.
fn same_id(a: &Option<String>, b: &Option<String>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        (None, None) => true,
        _ => false,
    }
}

/// The comparable subset of a NIC, for diffs.
fn snapshot(nic: &NetworkInterface) -> Value {
    json!({
        "subnet_id": nic.subnet_id,
        "public_ip_address_id": nic.public_ip_address_id,
        "network_security_group_id": nic.network_security_group_id,
        "private_ip_allocation_method": nic.private_ip_allocation_method,
        "private_ip_address": nic.private_ip_address,
        "dns_servers": nic.dns_servers,
        "tags": nic.tags,
    })
}

fn to_data(nic: &NetworkInterface) -> ModuleResult<Value> {
    serde_json::to_value(nic).map_err(|e| ModuleError::ExecutionFailed(e.to_string()))
}

/// Module for managing Azure network interfaces
pub struct AzureNetworkInterfaceModule;

impl AzureNetworkInterfaceModule {
    async fn ensure_present(
        &self,
        config: &NicModuleConfig,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let service = context.service.as_ref();
        let collection = NetworkInterfaces::new(context.service.clone());

        if !collection
            .exists(&config.resource_group, &config.name)
            .await?
        {
            let mut nic = config.to_new_interface()?;

            if context.check_mode {
                tracing::info!(
                    "Would create network interface '{}' in resource group '{}'",
                    config.name,
                    config.resource_group
                );
                return Ok(ModuleOutput::changed(format!(
                    "Would create network interface '{}' in resource group '{}'",
                    config.name, config.resource_group
                ))
                .with_data("action", json!("create")));
            }

            nic.save(service).await?;
            return Ok(ModuleOutput::changed(format!(
                "Created network interface '{}' in resource group '{}'",
                config.name, config.resource_group
            ))
            .with_data("network_interface", to_data(&nic)?));
        }

        let mut nic = collection.get(&config.resource_group, &config.name).await?;
        let mut desired = nic.clone();
        config.apply_to(&mut desired);

        let changed = changed_fields(&nic, &desired);
        if changed.is_empty() {
            return Ok(ModuleOutput::ok(format!(
                "Network interface '{}' is up to date",
                config.name
            ))
            .with_data("network_interface", to_data(&nic)?));
        }

        let diff = context.diff_mode.then(|| {
            Diff::new(
                serde_json::to_string_pretty(&snapshot(&nic)).unwrap_or_default(),
                serde_json::to_string_pretty(&snapshot(&desired)).unwrap_or_default(),
            )
            .with_details(changed.join(", "))
        });

        if context.check_mode {
            tracing::info!(
                "Would update network interface '{}': {}",
                config.name,
                changed.join(", ")
            );
            let output = ModuleOutput::changed(format!(
                "Would update network interface '{}'",
                config.name
            ))
            .with_data("action", json!("update"))
            .with_data("changes", json!(changed));
            return Ok(match diff {
                Some(diff) => output.with_diff(diff),
                None => output,
            });
        }

        let desired_values = to_data(&desired)?;
        let attributes: Map<String, Value> = PROPERTY_FIELDS
            .iter()
            .filter(|field| changed.contains(field))
            .map(|field| (field.to_string(), desired_values[*field].clone()))
            .collect();
        if !attributes.is_empty() {
            nic.update(service, &attributes).await?;
        }

        self.converge_reference(
            &mut nic,
            context,
            NicResource::Subnet,
            desired.subnet_id.as_deref(),
            changed.contains(&"subnet_id"),
        )
        .await?;
        self.converge_reference(
            &mut nic,
            context,
            NicResource::PublicIp,
            desired.public_ip_address_id.as_deref(),
            changed.contains(&"public_ip_address_id"),
        )
        .await?;
        self.converge_reference(
            &mut nic,
            context,
            NicResource::NetworkSecurityGroup,
            desired.network_security_group_id.as_deref(),
            changed.contains(&"network_security_group_id"),
        )
        .await?;

        let output = ModuleOutput::changed(format!("Updated network interface '{}'", config.name))
            .with_data("changes", json!(changed))
            .with_data("network_interface", to_data(&nic)?);
        Ok(match diff {
            Some(diff) => output.with_diff(diff),
            None => output,
        })
    }

    async fn converge_reference(
        &self,
        nic: &mut NetworkInterface,
        context: &ModuleContext,
        resource: NicResource,
        desired: Option<&str>,
        changed: bool,
    ) -> ModuleResult<()> {
        if !changed {
            return Ok(());
        }
        let service = context.service.as_ref();
        match (resource, desired) {
            (NicResource::PublicIp, Some(id)) => nic.attach_public_ip(service, id).await?,
            (NicResource::PublicIp, None) => nic.detach_public_ip(service).await?,
            (NicResource::NetworkSecurityGroup, Some(id)) => {
                nic.attach_network_security_group(service, id).await?
            }
            (NicResource::NetworkSecurityGroup, None) => {
                nic.detach_network_security_group(service).await?
            }
            (NicResource::Subnet, Some(id)) => nic.attach_subnet(service, id).await?,
            (NicResource::Subnet, None) => {
                return Err(ModuleError::InvalidParameter(
                    "subnet_id can not be removed".to_string(),
                ))
            }
        }
        Ok(())
    }

    async fn ensure_absent(
        &self,
        config: &NicModuleConfig,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let collection = NetworkInterfaces::new(context.service.clone());
        if !collection
            .exists(&config.resource_group, &config.name)
            .await?
        {
            return Ok(ModuleOutput::ok(format!(
                "Network interface '{}' does not exist",
                config.name
            )));
        }

        if context.check_mode {
            tracing::info!(
                "Would delete network interface: {}/{}",
                config.resource_group,
                config.name
            );
            return Ok(ModuleOutput::changed(format!(
                "Would delete network interface '{}'",
                config.name
            ))
            .with_data("action", json!("delete")));
        }

        let mut nic = NetworkInterface::new(&config.name);
        nic.resource_group = Some(config.resource_group.clone());
        if nic.destroy(context.service.as_ref()).await? {
            Ok(ModuleOutput::changed(format!(
                "Deleted network interface '{}'",
                config.name
            )))
        } else {
            Ok(ModuleOutput::ok(format!(
                "Network interface '{}' does not exist",
                config.name
            )))
        }
    }
}

#[async_trait]
impl Module for AzureNetworkInterfaceModule {
    fn name(&self) -> &'static str {
        "azure_network_interface"
    }

    fn description(&self) -> &'static str {
        "Manage Azure network interfaces"
    }

    fn required_params(&self) -> &[&'static str] {
        &["name", "resource_group"]
    }

    fn validate_params(&self, params: &ModuleParams) -> ModuleResult<()> {
        NicModuleConfig::from_params(params).map(|_| ())
    }

    async fn execute(
        &self,
        params: &ModuleParams,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let config = NicModuleConfig::from_params(params)?;
        match config.state {
            DesiredState::Present => self.ensure_present(&config, context).await,
            DesiredState::Absent => self.ensure_absent(&config, context).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, Value)]) -> ModuleParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_reference_parsing() {
        let p = params(&[
            ("public_ip_address_id", json!("")),
            ("network_security_group_id", json!("/nsg")),
        ]);
        assert_eq!(
            Reference::from_params(&p, "public_ip_address_id").unwrap(),
            Reference::Detached
        );
        assert_eq!(
            Reference::from_params(&p, "network_security_group_id").unwrap(),
            Reference::Attached("/nsg".into())
        );
        assert_eq!(
            Reference::from_params(&p, "missing").unwrap(),
            Reference::Unspecified
        );
    }

    #[test]
    fn test_address_implies_static() {
        let config = NicModuleConfig::from_params(&params(&[
            ("name", json!("nic")),
            ("resource_group", json!("rg")),
            ("location", json!("westus")),
            ("subnet_id", json!("/subnet")),
            ("private_ip_address", json!("10.0.0.10")),
        ]))
        .unwrap();
        let nic = config.to_new_interface().unwrap();
        assert_eq!(nic.private_ip_allocation_method, Some(IpAllocationMethod::Static));
        assert_eq!(nic.ip_configuration_name.as_deref(), Some("ipconfig1"));
    }

    #[test]
    fn test_create_requires_subnet() {
        let config = NicModuleConfig::from_params(&params(&[
            ("name", json!("nic")),
            ("resource_group", json!("rg")),
            ("location", json!("westus")),
        ]))
        .unwrap();
        assert!(matches!(
            config.to_new_interface(),
            Err(ModuleError::MissingParameter(ref p)) if p == "subnet_id"
        ));
    }

    #[test]
    fn test_changed_fields_ignores_id_case() {
        let mut current = NetworkInterface::new("nic");
        current.subnet_id = Some("/Subscriptions/S/subnet".into());
        let mut desired = current.clone();
        desired.subnet_id = Some("/subscriptions/s/SUBNET".into());
        assert!(changed_fields(&current, &desired).is_empty());

        desired.network_security_group_id = Some("/nsg".into());
        assert_eq!(
            changed_fields(&current, &desired),
            vec!["network_security_group_id"]
        );
    }

    #[test]
    fn test_invalid_allocation_method() {
        let err = NicModuleConfig::from_params(&params(&[
            ("name", json!("nic")),
            ("resource_group", json!("rg")),
            ("private_ip_allocation_method", json!("sometimes")),
        ]))
        .unwrap_err();
        assert!(matches!(err, ModuleError::Resource(_)));
    }
}
