//! Network security rule commands
//!
//! Implements `azurerm-network security-rule ...`.

use super::CommandContext;
use crate::cli::output::cell;
use anyhow::{Context, Result};
use azurerm_network::network::{NetworkSecurityRule, NetworkSecurityRules};
use clap::{Args, Parser, Subcommand};

/// Arguments for the security-rule command
#[derive(Parser, Debug, Clone)]
pub struct SecurityRuleArgs {
    #[command(subcommand)]
    pub action: SecurityRuleAction,
}

/// Security rule subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SecurityRuleAction {
    /// List the rules of a network security group
    List(GroupRef),

    /// Show one rule
    Show(RuleRef),

    /// Create or replace a rule
    Create(CreateArgs),

    /// Delete a rule
    Delete(RuleRef),
}

/// Identifies a network security group
#[derive(Args, Debug, Clone)]
pub struct GroupRef {
    /// Resource group
    #[arg(short = 'g', long)]
    pub resource_group: String,

    /// Network security group name
    #[arg(long = "nsg")]
    pub network_security_group_name: String,
}

/// Identifies one rule
#[derive(Args, Debug, Clone)]
pub struct RuleRef {
    #[command(flatten)]
    pub group: GroupRef,

    /// Rule name
    #[arg(short = 'n', long)]
    pub name: String,
}

/// Arguments for `security-rule create`
#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    #[command(flatten)]
    pub rule: RuleRef,

    /// Priority, 100 to 4096
    #[arg(long)]
    pub priority: u32,

    /// Tcp, Udp, Icmp, Esp, Ah or *
    #[arg(long, default_value = "*")]
    pub protocol: String,

    #[arg(long, default_value = "*")]
    pub source_port_range: String,

    #[arg(long, default_value = "*")]
    pub destination_port_range: String,

    #[arg(long, default_value = "*")]
    pub source_address_prefix: String,

    #[arg(long, default_value = "*")]
    pub destination_address_prefix: String,

    /// Allow or Deny
    #[arg(long, default_value = "Allow")]
    pub access: String,

    /// Inbound or Outbound
    #[arg(long, default_value = "Inbound")]
    pub direction: String,

    /// Free text description
    #[arg(long)]
    pub description: Option<String>,
}

impl CreateArgs {
    fn to_rule(&self) -> Result<NetworkSecurityRule> {
        Ok(NetworkSecurityRule {
            name: self.rule.name.clone(),
            resource_group: Some(self.rule.group.resource_group.clone()),
            network_security_group_name: Some(
                self.rule.group.network_security_group_name.clone(),
            ),
            description: self.description.clone(),
            protocol: Some(self.protocol.parse()?),
            source_port_range: Some(self.source_port_range.clone()),
            destination_port_range: Some(self.destination_port_range.clone()),
            source_address_prefix: Some(self.source_address_prefix.clone()),
            destination_address_prefix: Some(self.destination_address_prefix.clone()),
            access: Some(self.access.parse()?),
            priority: Some(self.priority),
            direction: Some(self.direction.parse()?),
            ..Default::default()
        })
    }
}

fn title(rule: &NetworkSecurityRule) -> String {
    format!("Network Security Rule {}", rule.name)
}

impl SecurityRuleArgs {
    /// Execute the security-rule command
    pub async fn execute(&self, ctx: &CommandContext) -> Result<i32> {
        let rules = NetworkSecurityRules::new(ctx.service.clone());

        match &self.action {
            SecurityRuleAction::List(args) => {
                let found = rules
                    .all(&args.resource_group, &args.network_security_group_name)
                    .await?;
                ctx.output.collection(
                    &found,
                    &["NAME", "PRIORITY", "DIRECTION", "ACCESS", "PROTOCOL", "PORTS"],
                    |rule| {
                        vec![
                            rule.name.clone(),
                            rule.priority
                                .map(|p| p.to_string())
                                .unwrap_or_else(|| "-".to_string()),
                            rule.direction
                                .map(|d| d.to_string())
                                .unwrap_or_else(|| "-".to_string()),
                            rule.access
                                .map(|a| a.to_string())
                                .unwrap_or_else(|| "-".to_string()),
                            rule.protocol
                                .map(|p| p.to_string())
                                .unwrap_or_else(|| "-".to_string()),
                            cell(rule.destination_port_range.as_deref()),
                        ]
                    },
                )?;
            }

            SecurityRuleAction::Show(args) => {
                let rule = rules
                    .get(
                        &args.group.resource_group,
                        &args.group.network_security_group_name,
                        &args.name,
                    )
                    .await?;
                ctx.output.record(&title(&rule), &rule)?;
            }

            SecurityRuleAction::Create(args) => {
                let mut rule = args.to_rule()?;
                rule.save(ctx.service.as_ref())
                    .await
                    .with_context(|| format!("Failed to create security rule {}", rule.name))?;
                ctx.output.record(&title(&rule), &rule)?;
            }

            SecurityRuleAction::Delete(args) => {
                let rule = NetworkSecurityRule {
                    name: args.name.clone(),
                    resource_group: Some(args.group.resource_group.clone()),
                    network_security_group_name: Some(
                        args.group.network_security_group_name.clone(),
                    ),
                    ..Default::default()
                };
                if rule.destroy(ctx.service.as_ref()).await? {
                    ctx.output
                        .success(&format!("Network Security Rule {} deleted", args.name));
                } else {
                    ctx.output.warning(&format!(
                        "Network Security Rule {} does not exist in Network Security Group {}",
                        args.name, args.group.network_security_group_name
                    ));
                }
            }
        }

        Ok(0)
    }
}
