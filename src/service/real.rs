//! [`NetworkService`] backed by Azure Resource Manager.

use super::{
    apply_nic_resource, nic_write_context, rule_write_context, NetworkInterfaceParams,
    NetworkService, NicResource, SecurityRuleParams,
};
use crate::client::ArmClient;
use crate::config::Config;
use crate::error::Result;
use crate::models::{
    ExpressRouteServiceProviderResource, NetworkInterfaceResource, SecurityRuleResource,
};
use crate::resource_id::{ResourceId, NETWORK_PROVIDER};
use async_trait::async_trait;
use tracing::{debug, info};

/// The production network service.
#[derive(Debug, Clone)]
pub struct AzureNetworkService {
    client: ArmClient,
    subscription_id: String,
}

impl AzureNetworkService {
    /// Create a service for `subscription_id` over an existing client.
    pub fn new(client: ArmClient, subscription_id: impl Into<String>) -> Self {
        Self {
            client,
            subscription_id: subscription_id.into(),
        }
    }

    /// Create a service from the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let subscription_id = config.azure.subscription()?.to_string();
        let client = ArmClient::from_config(config)?;
        Ok(Self::new(client, subscription_id))
    }

    /// Subscription the service operates on.
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    fn nic_path(&self, resource_group: &str, name: &str) -> String {
        ResourceId::network_interface(&self.subscription_id, resource_group, name).to_string()
    }

    fn rule_path(&self, resource_group: &str, nsg: &str, name: &str) -> String {
        ResourceId::security_rule(&self.subscription_id, resource_group, nsg, name).to_string()
    }

    fn rules_path(&self, resource_group: &str, nsg: &str) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{resource_group}/providers/{NETWORK_PROVIDER}/networkSecurityGroups/{nsg}/securityRules",
            self.subscription_id
        )
    }

    async fn put_nic(
        &self,
        resource_group: &str,
        name: &str,
        body: &NetworkInterfaceResource,
    ) -> Result<NetworkInterfaceResource> {
        let msg = nic_write_context(name, resource_group);
        debug!("{msg}");
        let nic = self
            .client
            .put(&self.nic_path(resource_group, name), body, &msg)
            .await?;
        debug!("Network Interface {name} Created/Updated Successfully!");
        Ok(nic)
    }
}

#[async_trait]
impl NetworkService for AzureNetworkService {
    async fn create_or_update_network_interface(
        &self,
        params: &NetworkInterfaceParams,
    ) -> Result<NetworkInterfaceResource> {
        let msg = nic_write_context(&params.name, &params.resource_group);
        let current: Option<NetworkInterfaceResource> = self
            .client
            .get_optional(&self.nic_path(&params.resource_group, &params.name), &msg)
            .await?;

        let body = match current {
            Some(mut nic) => {
                params.apply_to(&mut nic);
                nic
            }
            None => params.to_resource(),
        };
        self.put_nic(&params.resource_group, &params.name, &body).await
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

        let mut nic: NetworkInterfaceResource = self
            .client
            .get(&self.nic_path(resource_group, name), &msg)
            .await?;
        apply_nic_resource(&mut nic, resource, Some(resource_id))?;

        let nic = self
            .client
            .put(&self.nic_path(resource_group, name), &nic, &msg)
            .await?;
        debug!("{resource} {resource_id} attached to Network Interface {name} successfully!");
        Ok(nic)
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

        let mut nic: NetworkInterfaceResource = self
            .client
            .get(&self.nic_path(resource_group, name), &msg)
            .await?;
        apply_nic_resource(&mut nic, resource, None)?;

        let nic = self
            .client
            .put(&self.nic_path(resource_group, name), &nic, &msg)
            .await?;
        debug!("{resource} detached from Network Interface {name} successfully!");
        Ok(nic)
    }

    async fn delete_network_interface(&self, resource_group: &str, name: &str) -> Result<bool> {
        let msg = format!("Deleting Network Interface {name} from Resource Group {resource_group}.");
        debug!("{msg}");
        let deleted = self
            .client
            .delete(&self.nic_path(resource_group, name), &msg)
            .await?;
        if deleted {
            info!("Network Interface {name} deleted successfully.");
        } else {
            debug!("Network Interface {name} did not exist.");
        }
        Ok(deleted)
    }

    async fn get_network_interface(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<NetworkInterfaceResource> {
        let msg = format!("Getting Network Interface {name} from Resource Group {resource_group}.");
        debug!("{msg}");
        let nic = self
            .client
            .get(&self.nic_path(resource_group, name), &msg)
            .await?;
        debug!("Network Interface {name} retrieved successfully.");
        Ok(nic)
    }

    async fn list_network_interfaces(
        &self,
        resource_group: &str,
    ) -> Result<Vec<NetworkInterfaceResource>> {
        let msg = format!("Listing Network Interfaces in Resource Group {resource_group}.");
        debug!("{msg}");
        let path = format!(
            "/subscriptions/{}/resourceGroups/{resource_group}/providers/{NETWORK_PROVIDER}/networkInterfaces",
            self.subscription_id
        );
        let nics = self.client.list(&path, &msg).await?;
        debug!("Listed Network Interfaces in Resource Group {resource_group} successfully.");
        Ok(nics)
    }

    async fn list_all_network_interfaces(&self) -> Result<Vec<NetworkInterfaceResource>> {
        let msg = format!(
            "Listing Network Interfaces in Subscription {}.",
            self.subscription_id
        );
        debug!("{msg}");
        let path = format!(
            "/subscriptions/{}/providers/{NETWORK_PROVIDER}/networkInterfaces",
            self.subscription_id
        );
        self.client.list(&path, &msg).await
    }

    async fn network_interface_exists(&self, resource_group: &str, name: &str) -> Result<bool> {
        let msg = format!("Checking Network Interface {name} in Resource Group {resource_group}.");
        debug!("{msg}");
        let nic: Option<NetworkInterfaceResource> = self
            .client
            .get_optional(&self.nic_path(resource_group, name), &msg)
            .await?;
        Ok(nic.is_some())
    }

    async fn create_or_update_network_security_rule(
        &self,
        params: &SecurityRuleParams,
    ) -> Result<SecurityRuleResource> {
        let msg = rule_write_context(&params.name, &params.resource_group);
        debug!("{msg}");
        let path = self.rule_path(
            &params.resource_group,
            &params.network_security_group_name,
            &params.name,
        );
        let rule = self.client.put(&path, &params.to_resource(), &msg).await?;
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
        self.client
            .get(
                &self.rule_path(resource_group, network_security_group_name, name),
                &msg,
            )
            .await
    }

    async fn list_network_security_rules(
        &self,
        resource_group: &str,
        network_security_group_name: &str,
    ) -> Result<Vec<SecurityRuleResource>> {
        let msg = format!(
            "Listing Network Security Rules of Network Security Group {network_security_group_name} in Resource Group {resource_group}."
        );
        debug!("{msg}");
        self.client
            .list(
                &self.rules_path(resource_group, network_security_group_name),
                &msg,
            )
            .await
    }

    async fn delete_network_security_rule(
        &self,
        resource_group: &str,
        network_security_group_name: &str,
        name: &str,
    ) -> Result<bool> {
        let msg = format!(
            "Deleting Network Security Rule {name} of Network Security Group {network_security_group_name} from Resource Group {resource_group}."
        );
        debug!("{msg}");
        let deleted = self
            .client
            .delete(
                &self.rule_path(resource_group, network_security_group_name, name),
                &msg,
            )
            .await?;
        if deleted {
            info!("Network Security Rule {name} deleted successfully.");
        }
        Ok(deleted)
    }

    async fn network_security_rule_exists(
        &self,
        resource_group: &str,
        network_security_group_name: &str,
        name: &str,
    ) -> Result<bool> {
        let msg = format!("Checking Network Security Rule {name} in Resource Group {resource_group}.");
        let rule: Option<SecurityRuleResource> = self
            .client
            .get_optional(
                &self.rule_path(resource_group, network_security_group_name, name),
                &msg,
            )
            .await?;
        Ok(rule.is_some())
    }

    async fn list_express_route_service_providers(
        &self,
    ) -> Result<Vec<ExpressRouteServiceProviderResource>> {
        let msg = "Getting list of Express Route Service Providers.".to_string();
        debug!("{msg}");
        let path = format!(
            "/subscriptions/{}/providers/{NETWORK_PROVIDER}/expressRouteServiceProviders",
            self.subscription_id
        );
        let providers = self.client.list(&path, &msg).await?;
        debug!("Successfully retrieved Express Route Service Providers.");
        Ok(providers)
    }
}
