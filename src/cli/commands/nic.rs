//! Network interface commands
//!
//! Implements `azurerm-network nic ...`.

use super::CommandContext;
use crate::cli::output::cell;
use crate::cli::parse_key_value;
use anyhow::{Context, Result};
use azurerm_network::models::IpAllocationMethod;
use azurerm_network::network::{NetworkInterface, NetworkInterfaces};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};

/// Arguments for the nic command
#[derive(Parser, Debug, Clone)]
pub struct NicArgs {
    #[command(subcommand)]
    pub action: NicAction,
}

/// Network interface subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum NicAction {
    /// List network interfaces
    List(ListArgs),

    /// Show one network interface
    Show(NicRef),

    /// Create a network interface
    Create(CreateArgs),

    /// Update mutable attributes of a network interface
    Update(UpdateArgs),

    /// Delete a network interface
    Delete(NicRef),

    /// Attach a subnet, public IP or network security group
    Attach(AttachArgs),

    /// Detach the public IP or network security group
    Detach(DetachArgs),
}

/// Identifies one NIC
#[derive(Args, Debug, Clone)]
pub struct NicRef {
    /// Resource group
    #[arg(short = 'g', long)]
    pub resource_group: String,

    /// Network interface name
    #[arg(short = 'n', long)]
    pub name: String,
}

/// Arguments for `nic list`
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Only list this resource group (default: whole subscription)
    #[arg(short = 'g', long)]
    pub resource_group: Option<String>,
}

/// Arguments for `nic create`
#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    #[command(flatten)]
    pub nic: NicRef,

    /// Azure region
    #[arg(short = 'l', long)]
    pub location: String,

    /// Subnet of the ip configuration
    #[arg(long)]
    pub subnet_id: String,

    /// Public IP to attach
    #[arg(long)]
    pub public_ip_address_id: Option<String>,

    /// Network security group to attach
    #[arg(long)]
    pub network_security_group_id: Option<String>,

    /// Name of the ip configuration
    #[arg(long, default_value = "ipconfig1")]
    pub ip_configuration_name: String,

    /// Dynamic or Static
    #[arg(long, default_value = "Dynamic")]
    pub private_ip_allocation_method: String,

    /// Private address, for Static allocation
    #[arg(long)]
    pub private_ip_address: Option<String>,

    /// DNS server (repeatable)
    #[arg(long = "dns-server")]
    pub dns_servers: Vec<String>,

    /// Tag as key=value (repeatable)
    #[arg(long = "tag", value_parser = parse_key_value)]
    pub tags: Vec<(String, String)>,
}

/// Arguments for `nic update`
#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub nic: NicRef,

    /// Attribute as key=value; values are read as JSON when they parse (repeatable)
    #[arg(long = "set", value_parser = parse_key_value, required = true)]
    pub attributes: Vec<(String, String)>,
}

/// Arguments for `nic attach`
#[derive(Args, Debug, Clone)]
#[command(group = clap::ArgGroup::new("resource").required(true).args(["subnet", "public_ip", "nsg"]))]
pub struct AttachArgs {
    #[command(flatten)]
    pub nic: NicRef,

    /// Subnet id
    #[arg(long)]
    pub subnet: Option<String>,

    /// Public IP id
    #[arg(long)]
    pub public_ip: Option<String>,

    /// Network security group id
    #[arg(long)]
    pub nsg: Option<String>,
}

/// Arguments for `nic detach`
#[derive(Args, Debug, Clone)]
#[command(group = clap::ArgGroup::new("resource").required(true).args(["public_ip", "nsg"]))]
pub struct DetachArgs {
    #[command(flatten)]
    pub nic: NicRef,

    /// Detach the public IP
    #[arg(long)]
    pub public_ip: bool,

    /// Detach the network security group
    #[arg(long)]
    pub nsg: bool,
}

/// Read a `--set` value: JSON when it parses, a plain string otherwise.
pub fn attribute_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn title(nic: &NetworkInterface) -> String {
    format!("Network Interface {}", nic.name)
}

impl NicArgs {
    /// Execute the nic command
    pub async fn execute(&self, ctx: &CommandContext) -> Result<i32> {
        let service = ctx.service.as_ref();
        let collection = NetworkInterfaces::new(ctx.service.clone());

        match &self.action {
            NicAction::List(args) => {
                let nics = match &args.resource_group {
                    Some(resource_group) => collection.all(resource_group).await?,
                    None => collection.all_in_subscription().await?,
                };
                ctx.output.collection(
                    &nics,
                    &["NAME", "RESOURCE GROUP", "LOCATION", "PRIVATE IP", "ALLOCATION"],
                    |nic| {
                        vec![
                            nic.name.clone(),
                            cell(nic.resource_group.as_deref()),
                            cell(nic.location.as_deref()),
                            cell(nic.private_ip_address.as_deref()),
                            nic.private_ip_allocation_method
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| "-".to_string()),
                        ]
                    },
                )?;
            }

            NicAction::Show(args) => {
                let nic = collection.get(&args.resource_group, &args.name).await?;
                ctx.output.record(&title(&nic), &nic)?;
            }

            NicAction::Create(args) => {
                let mut nic = NetworkInterface::new(&args.nic.name);
                nic.resource_group = Some(args.nic.resource_group.clone());
                nic.location = Some(args.location.clone());
                nic.subnet_id = Some(args.subnet_id.clone());
                nic.public_ip_address_id = args.public_ip_address_id.clone();
                nic.network_security_group_id = args.network_security_group_id.clone();
                nic.ip_configuration_name = Some(args.ip_configuration_name.clone());
                nic.private_ip_allocation_method = Some(
                    args.private_ip_allocation_method
                        .parse::<IpAllocationMethod>()?,
                );
                nic.private_ip_address = args.private_ip_address.clone();
                nic.dns_servers = args.dns_servers.clone();
                nic.tags = args.tags.iter().cloned().collect();

                nic.save(service)
                    .await
                    .with_context(|| format!("Failed to create network interface {}", nic.name))?;
                ctx.output.record(&title(&nic), &nic)?;
            }

            NicAction::Update(args) => {
                let attributes: Map<String, Value> = args
                    .attributes
                    .iter()
                    .map(|(key, value)| (key.clone(), attribute_value(value)))
                    .collect();

                let mut nic = collection
                    .get(&args.nic.resource_group, &args.nic.name)
                    .await?;
                nic.update(service, &attributes).await?;
                ctx.output.record(&title(&nic), &nic)?;
            }

            NicAction::Delete(args) => {
                let mut nic = NetworkInterface::new(&args.name);
                nic.resource_group = Some(args.resource_group.clone());
                if nic.destroy(service).await? {
                    ctx.output
                        .success(&format!("Network Interface {} deleted", args.name));
                } else {
                    ctx.output.warning(&format!(
                        "Network Interface {} does not exist in Resource Group {}",
                        args.name, args.resource_group
                    ));
                }
            }

            NicAction::Attach(args) => {
                let mut nic = collection
                    .get(&args.nic.resource_group, &args.nic.name)
                    .await?;
                if let Some(subnet) = &args.subnet {
                    nic.attach_subnet(service, subnet).await?;
                }
                if let Some(public_ip) = &args.public_ip {
                    nic.attach_public_ip(service, public_ip).await?;
                }
                if let Some(nsg) = &args.nsg {
                    nic.attach_network_security_group(service, nsg).await?;
                }
                ctx.output.record(&title(&nic), &nic)?;
            }

            NicAction::Detach(args) => {
                let mut nic = collection
                    .get(&args.nic.resource_group, &args.nic.name)
                    .await?;
                if args.public_ip {
                    nic.detach_public_ip(service).await?;
                }
                if args.nsg {
                    nic.detach_network_security_group(service).await?;
                }
                ctx.output.record(&title(&nic), &nic)?;
            }
        }

        Ok(0)
    }
}
