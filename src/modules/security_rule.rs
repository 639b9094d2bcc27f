//! Azure network security rule module
//!
//! ## Parameters
//!
//! - `name` (required): Rule name
//! - `resource_group` (required): Resource group
//! - `network_security_group_name` (required): NSG holding the rule
//! - `priority`: 100 to 4096 (required to create)
//! - `protocol`: `Tcp`, `Udp`, `Icmp` or `*` (default `*`)
//! - `source_port_range`, `destination_port_range`: default `*`
//! - `source_address_prefix`, `destination_address_prefix`: default `*`
//! - `access`: `Allow` (default) or `Deny`
//! - `direction`: `Inbound` (default) or `Outbound`
//! - `description`: Free text
//! - `state`: `present` (default) or `absent`
//!
//! Unset attributes keep their current value on an existing rule; the
//! defaults only apply when the rule is created.

use super::{
    desired_state, DesiredState, Diff, Module, ModuleContext, ModuleError, ModuleOutput,
    ModuleParams, ModuleResult, ParamExt,
};
use crate::models::{SecurityRuleAccess, SecurityRuleDirection, SecurityRuleProtocol};
use crate::network::{NetworkSecurityRule, NetworkSecurityRules};
use async_trait::async_trait;
use serde_json::json;

const ANY: &str = "*";

/// Security rule module configuration
#[derive(Debug, Clone)]
struct SecurityRuleModuleConfig {
    name: String,
    resource_group: String,
    network_security_group_name: String,
    description: Option<String>,
    protocol: Option<SecurityRuleProtocol>,
    source_port_range: Option<String>,
    destination_port_range: Option<String>,
    source_address_prefix: Option<String>,
    destination_address_prefix: Option<String>,
    access: Option<SecurityRuleAccess>,
    priority: Option<u32>,
    direction: Option<SecurityRuleDirection>,
    state: DesiredState,
}

impl SecurityRuleModuleConfig {
    fn from_params(params: &ModuleParams) -> ModuleResult<Self> {
        Ok(Self {
            name: params.get_string_required("name")?,
            resource_group: params.get_string_required("resource_group")?,
            network_security_group_name: params
                .get_string_required("network_security_group_name")?,
            description: params.get_string("description")?,
            protocol: params
                .get_string("protocol")?
                .map(|p| p.parse())
                .transpose()?,
            source_port_range: params.get_string("source_port_range")?,
            destination_port_range: params.get_string("destination_port_range")?,
            source_address_prefix: params.get_string("source_address_prefix")?,
            destination_address_prefix: params.get_string("destination_address_prefix")?,
            access: params.get_string("access")?.map(|a| a.parse()).transpose()?,
            priority: params.get_u32("priority")?,
            direction: params
                .get_string("direction")?
                .map(|d| d.parse())
                .transpose()?,
            state: desired_state(params)?,
        })
    }

    /// Overlay the requested attributes on `rule`.
    fn apply_to(&self, rule: &mut NetworkSecurityRule) {
        fn set<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if let Some(value) = value {
                *target = Some(value.clone());
            }
        }

        set(&mut rule.description, &self.description);
        set(&mut rule.protocol, &self.protocol);
        set(&mut rule.source_port_range, &self.source_port_range);
        set(&mut rule.destination_port_range, &self.destination_port_range);
        set(&mut rule.source_address_prefix, &self.source_address_prefix);
        set(
            &mut rule.destination_address_prefix,
            &self.destination_address_prefix,
        );
        set(&mut rule.access, &self.access);
        set(&mut rule.priority, &self.priority);
        set(&mut rule.direction, &self.direction);
    }

    /// A rule built from scratch, defaults filled in.
    fn to_new_rule(&self) -> ModuleResult<NetworkSecurityRule> {
        if self.priority.is_none() {
            return Err(ModuleError::MissingParameter("priority".to_string()));
        }

        let mut rule = NetworkSecurityRule {
            name: self.name.clone(),
            resource_group: Some(self.resource_group.clone()),
            network_security_group_name: Some(self.network_security_group_name.clone()),
            protocol: Some(SecurityRuleProtocol::Any),
            source_port_range: Some(ANY.to_string()),
            destination_port_range: Some(ANY.to_string()),
            source_address_prefix: Some(ANY.to_string()),
            destination_address_prefix: Some(ANY.to_string()),
            access: Some(SecurityRuleAccess::Allow),
            direction: Some(SecurityRuleDirection::Inbound),
            ..Default::default()
        };
        self.apply_to(&mut rule);
        Ok(rule)
    }
}

fn changed_fields(current: &NetworkSecurityRule, desired: &NetworkSecurityRule) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if current.description != desired.description {
        changed.push("description");
    }
    if current.protocol != desired.protocol {
        changed.push("protocol");
    }
    if current.source_port_range != desired.source_port_range {
        changed.push("source_port_range");
    }
    if current.destination_port_range != desired.destination_port_range {
        changed.push("destination_port_range");
    }
    if current.source_address_prefix != desired.source_address_prefix {
        changed.push("source_address_prefix");
    }
    if current.destination_address_prefix != desired.destination_address_prefix {
        changed.push("destination_address_prefix");
    }
    if current.access != desired.access {
        changed.push("access");
    }
    if current.priority != desired.priority {
        changed.push("priority");
    }
    if current.direction != desired.direction {
        changed.push("direction");
    }
    changed
}

fn to_data(rule: &NetworkSecurityRule) -> ModuleResult<serde_json::Value> {
    serde_json::to_value(rule).map_err(|e| ModuleError::ExecutionFailed(e.to_string()))
}

/// Module for managing rules of an Azure network security group
pub struct AzureSecurityRuleModule;

impl AzureSecurityRuleModule {
    async fn ensure_present(
        &self,
        config: &SecurityRuleModuleConfig,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let rules = NetworkSecurityRules::new(context.service.clone());
        let exists = rules
            .exists(
                &config.resource_group,
                &config.network_security_group_name,
                &config.name,
            )
            .await?;

        if !exists {
            let mut rule = config.to_new_rule()?;
            // Surface priority and other attribute errors before a dry run reports success
            rule.to_params()?;

            if context.check_mode {
                tracing::info!(
                    "Would create security rule '{}' in network security group '{}'",
                    config.name,
                    config.network_security_group_name
                );
                return Ok(ModuleOutput::changed(format!(
                    "Would create security rule '{}' in network security group '{}'",
                    config.name, config.network_security_group_name
                ))
                .with_data("action", json!("create")));
            }

            rule.save(context.service.as_ref()).await?;
            return Ok(ModuleOutput::changed(format!(
                "Created security rule '{}' in network security group '{}'",
                config.name, config.network_security_group_name
            ))
            .with_data("security_rule", to_data(&rule)?));
        }

        let current = rules
            .get(
                &config.resource_group,
                &config.network_security_group_name,
                &config.name,
            )
            .await?;
        let mut desired = current.clone();
        config.apply_to(&mut desired);

        let changed = changed_fields(&current, &desired);
        if changed.is_empty() {
            return Ok(ModuleOutput::ok(format!(
                "Security rule '{}' is up to date",
                config.name
            ))
            .with_data("security_rule", to_data(&current)?));
        }

        desired.to_params()?;
        let diff = context.diff_mode.then(|| {
            Diff::new(
                serde_json::to_string_pretty(&current).unwrap_or_default(),
                serde_json::to_string_pretty(&desired).unwrap_or_default(),
            )
            .with_details(changed.join(", "))
        });

        let output = if context.check_mode {
            ModuleOutput::changed(format!("Would update security rule '{}'", config.name))
                .with_data("action", json!("update"))
                .with_data("changes", json!(changed))
        } else {
            desired.save(context.service.as_ref()).await?;
            ModuleOutput::changed(format!("Updated security rule '{}'", config.name))
                .with_data("changes", json!(changed))
                .with_data("security_rule", to_data(&desired)?)
        };

        Ok(match diff {
            Some(diff) => output.with_diff(diff),
            None => output,
        })
    }

    async fn ensure_absent(
        &self,
        config: &SecurityRuleModuleConfig,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let rules = NetworkSecurityRules::new(context.service.clone());
        let exists = rules
            .exists(
                &config.resource_group,
                &config.network_security_group_name,
                &config.name,
            )
            .await?;
        if !exists {
            return Ok(ModuleOutput::ok(format!(
                "Security rule '{}' does not exist",
                config.name
            )));
        }

        if context.check_mode {
            return Ok(
                ModuleOutput::changed(format!("Would delete security rule '{}'", config.name))
                    .with_data("action", json!("delete")),
            );
        }

        let rule = NetworkSecurityRule {
            name: config.name.clone(),
            resource_group: Some(config.resource_group.clone()),
            network_security_group_name: Some(config.network_security_group_name.clone()),
            ..Default::default()
        };
        if rule.destroy(context.service.as_ref()).await? {
            Ok(ModuleOutput::changed(format!(
                "Deleted security rule '{}'",
                config.name
            )))
        } else {
            Ok(ModuleOutput::ok(format!(
                "Security rule '{}' does not exist",
                config.name
            )))
        }
    }
}

#[async_trait]
impl Module for AzureSecurityRuleModule {
    fn name(&self) -> &'static str {
        "azure_security_rule"
    }

    fn description(&self) -> &'static str {
        "Manage rules of Azure network security groups"
    }

    fn required_params(&self) -> &[&'static str] {
        &["name", "resource_group", "network_security_group_name"]
    }

    fn validate_params(&self, params: &ModuleParams) -> ModuleResult<()> {
        SecurityRuleModuleConfig::from_params(params).map(|_| ())
    }

    async fn execute(
        &self,
        params: &ModuleParams,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let config = SecurityRuleModuleConfig::from_params(params)?;
        match config.state {
            DesiredState::Present => self.ensure_present(&config, context).await,
            DesiredState::Absent => self.ensure_absent(&config, context).await,
        }
    }
}
