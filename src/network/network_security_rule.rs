//! Network security rule model and collection.

use crate::error::{Error, Result};
use crate::models::{
    SecurityRuleAccess, SecurityRuleDirection, SecurityRuleProtocol, SecurityRuleResource,
};
use crate::resource_id::{id_segment, resource_group_from_id};
use crate::service::{NetworkService, SecurityRuleParams};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::sync::Arc;

/// Priorities Azure accepts for user-defined rules.
pub const PRIORITY_RANGE: RangeInclusive<u32> = 100..=4096;

/// A security rule inside a network security group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSecurityRule {
    pub id: Option<String>,
    pub name: String,
    pub resource_group: Option<String>,
    pub network_security_group_name: Option<String>,
    pub description: Option<String>,
    pub protocol: Option<SecurityRuleProtocol>,
    pub source_port_range: Option<String>,
    pub destination_port_range: Option<String>,
    pub source_address_prefix: Option<String>,
    pub destination_address_prefix: Option<String>,
    pub access: Option<SecurityRuleAccess>,
    pub priority: Option<u32>,
    pub direction: Option<SecurityRuleDirection>,
    pub provisioning_state: Option<String>,
}

impl NetworkSecurityRule {
    /// A new, unsaved rule called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Flatten an ARM security rule. The NSG name is segment 8 of the id.
    pub fn parse(rule: &SecurityRuleResource) -> Self {
        let id = rule.id.clone();
        let properties = &rule.properties;

        Self {
            resource_group: id.as_deref().and_then(resource_group_from_id),
            network_security_group_name: id.as_deref().and_then(|id| id_segment(id, 8)),
            id,
            name: rule.name.clone().unwrap_or_default(),
            description: properties.description.clone(),
            protocol: properties.protocol,
            source_port_range: properties.source_port_range.clone(),
            destination_port_range: properties.destination_port_range.clone(),
            source_address_prefix: properties.source_address_prefix.clone(),
            destination_address_prefix: properties.destination_address_prefix.clone(),
            access: properties.access,
            priority: properties.priority,
            direction: properties.direction,
            provisioning_state: properties.provisioning_state.clone(),
        }
    }

    /// Create or replace the rule in Azure.
    pub async fn save(&mut self, service: &dyn NetworkService) -> Result<()> {
        let params = self.to_params()?;
        let rule = service.create_or_update_network_security_rule(&params).await?;
        *self = Self::parse(&rule);
        Ok(())
    }

    /// Delete the rule. Returns `false` when it did not exist.
    pub async fn destroy(&self, service: &dyn NetworkService) -> Result<bool> {
        let resource_group = required(&self.resource_group, "resource_group")?;
        let nsg = required(
            &self.network_security_group_name,
            "network_security_group_name",
        )?;
        service
            .delete_network_security_rule(resource_group, nsg, &self.name)
            .await
    }

    /// Request parameters for a create or update.
    pub fn to_params(&self) -> Result<SecurityRuleParams> {
        if self.name.is_empty() {
            return Err(Error::MissingAttribute("name".to_string()));
        }

        let priority = self
            .priority
            .ok_or_else(|| Error::MissingAttribute("priority".to_string()))?;
        if !PRIORITY_RANGE.contains(&priority) {
            return Err(Error::invalid_attribute(
                "priority",
                format!(
                    "{priority} is outside {}..={}",
                    PRIORITY_RANGE.start(),
                    PRIORITY_RANGE.end()
                ),
            ));
        }

        Ok(SecurityRuleParams {
            name: self.name.clone(),
            resource_group: required(&self.resource_group, "resource_group")?.to_string(),
            network_security_group_name: required(
                &self.network_security_group_name,
                "network_security_group_name",
            )?
            .to_string(),
            description: self.description.clone(),
            protocol: self
                .protocol
                .ok_or_else(|| Error::MissingAttribute("protocol".to_string()))?,
            source_port_range: required(&self.source_port_range, "source_port_range")?.to_string(),
            destination_port_range: required(&self.destination_port_range, "destination_port_range")?
                .to_string(),
            source_address_prefix: required(&self.source_address_prefix, "source_address_prefix")?
                .to_string(),
            destination_address_prefix: required(
                &self.destination_address_prefix,
                "destination_address_prefix",
            )?
            .to_string(),
            access: self
                .access
                .ok_or_else(|| Error::MissingAttribute("access".to_string()))?,
            priority,
            direction: self
                .direction
                .ok_or_else(|| Error::MissingAttribute("direction".to_string()))?,
        })
    }
}

fn required<'a>(value: &'a Option<String>, attribute: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::MissingAttribute(attribute.to_string()))
}

/// Lookups of security rules.
#[derive(Clone)]
pub struct NetworkSecurityRules {
    service: Arc<dyn NetworkService>,
}

impl NetworkSecurityRules {
    /// Collection over `service`.
    pub fn new(service: Arc<dyn NetworkService>) -> Self {
        Self { service }
    }

    /// Every rule in a network security group.
    pub async fn all(
        &self,
        resource_group: &str,
        network_security_group_name: &str,
    ) -> Result<Vec<NetworkSecurityRule>> {
        let rules = self
            .service
            .list_network_security_rules(resource_group, network_security_group_name)
            .await?;
        Ok(rules.iter().map(NetworkSecurityRule::parse).collect())
    }

    /// One rule.
    pub async fn get(
        &self,
        resource_group: &str,
        network_security_group_name: &str,
        name: &str,
    ) -> Result<NetworkSecurityRule> {
        let rule = self
            .service
            .get_network_security_rule(resource_group, network_security_group_name, name)
            .await?;
        Ok(NetworkSecurityRule::parse(&rule))
    }

    /// Whether the rule exists.
    pub async fn exists(
        &self,
        resource_group: &str,
        network_security_group_name: &str,
        name: &str,
    ) -> Result<bool> {
        self.service
            .network_security_rule_exists(resource_group, network_security_group_name, name)
            .await
    }
}
