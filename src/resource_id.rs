//! Azure Resource Manager resource identifiers.
//!
//! ARM ids have the shape
//! `/subscriptions/{sub}/resourceGroups/{rg}/providers/{namespace}/{type}/{name}`,
//! optionally followed by `/{child_type}/{child_name}` pairs. Subscription
//! scoped resources (such as ExpressRoute service providers) omit the
//! resource group.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Resource provider namespace of every resource this crate manages.
pub const NETWORK_PROVIDER: &str = "Microsoft.Network";

/// A parsed ARM resource id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    /// Subscription id
    pub subscription_id: String,
    /// Resource group, absent for subscription-scoped resources
    pub resource_group: Option<String>,
    /// Provider namespace, e.g. `Microsoft.Network`
    pub provider: String,
    /// Ancestors of the resource as `(type, name)` pairs, outermost first
    pub parents: Vec<(String, String)>,
    /// Type of the resource itself, e.g. `securityRules`
    pub resource_type: String,
    /// Name of the resource itself
    pub name: String,
}

impl ResourceId {
    /// Parse an ARM resource id.
    pub fn parse(id: &str) -> Result<Self> {
        let invalid = || Error::InvalidResourceId(id.to_string());

        let trimmed = id.strip_prefix('/').ok_or_else(invalid)?;
        let segments: Vec<&str> = trimmed.trim_end_matches('/').split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid());
        }

        let mut rest = segments.as_slice();

        let subscription_id = match rest {
            [key, sub, tail @ ..] if key.eq_ignore_ascii_case("subscriptions") => {
                rest = tail;
                (*sub).to_string()
            }
            _ => return Err(invalid()),
        };

        let resource_group = match rest {
            [key, rg, tail @ ..] if key.eq_ignore_ascii_case("resourceGroups") => {
                rest = tail;
                Some((*rg).to_string())
            }
            _ => None,
        };

        let provider = match rest {
            [key, ns, tail @ ..] if key.eq_ignore_ascii_case("providers") => {
                rest = tail;
                (*ns).to_string()
            }
            _ => return Err(invalid()),
        };

        if rest.is_empty() || rest.len() % 2 != 0 {
            return Err(invalid());
        }

        let mut pairs: Vec<(String, String)> = rest
            .chunks(2)
            .map(|pair| (pair[0].to_string(), pair[1].to_string()))
            .collect();
        let (resource_type, name) = pairs.pop().ok_or_else(invalid)?;

        Ok(Self {
            subscription_id,
            resource_group,
            provider,
            parents: pairs,
            resource_type,
            name,
        })
    }

    /// Id of a network interface.
    pub fn network_interface(subscription_id: &str, resource_group: &str, name: &str) -> Self {
        Self::network(subscription_id, Some(resource_group), vec![], "networkInterfaces", name)
    }

    /// Id of the ip configuration of a network interface.
    pub fn ip_configuration(
        subscription_id: &str,
        resource_group: &str,
        nic_name: &str,
        name: &str,
    ) -> Self {
        Self::network(
            subscription_id,
            Some(resource_group),
            vec![("networkInterfaces".to_string(), nic_name.to_string())],
            "ipConfigurations",
            name,
        )
    }

    /// Id of a security rule inside a network security group.
    pub fn security_rule(
        subscription_id: &str,
        resource_group: &str,
        nsg_name: &str,
        name: &str,
    ) -> Self {
        Self::network(
            subscription_id,
            Some(resource_group),
            vec![("networkSecurityGroups".to_string(), nsg_name.to_string())],
            "securityRules",
            name,
        )
    }

    /// Id of an ExpressRoute service provider.
    pub fn express_route_service_provider(subscription_id: &str, name: &str) -> Self {
        Self::network(subscription_id, None, vec![], "expressRouteServiceProviders", name)
    }

    fn network(
        subscription_id: &str,
        resource_group: Option<&str>,
        parents: Vec<(String, String)>,
        resource_type: &str,
        name: &str,
    ) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            resource_group: resource_group.map(str::to_string),
            provider: NETWORK_PROVIDER.to_string(),
            parents,
            resource_type: resource_type.to_string(),
            name: name.to_string(),
        }
    }

    /// Name of the direct parent resource, if any.
    pub fn parent_name(&self) -> Option<&str> {
        self.parents.last().map(|(_, name)| name.as_str())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/subscriptions/{}", self.subscription_id)?;
        if let Some(rg) = &self.resource_group {
            write!(f, "/resourceGroups/{rg}")?;
        }
        write!(f, "/providers/{}", self.provider)?;
        for (kind, name) in &self.parents {
            write!(f, "/{kind}/{name}")?;
        }
        write!(f, "/{}/{}", self.resource_type, self.name)
    }
}

impl FromStr for ResourceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// The `index`-th `/`-separated segment of an id (the leading empty segment counts).
pub fn id_segment(id: &str, index: usize) -> Option<String> {
    id.split('/')
        .nth(index)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Resource group of an id: segment 4 of
/// `/subscriptions/{sub}/resourceGroups/{rg}/...`.
pub fn resource_group_from_id(id: &str) -> Option<String> {
    id_segment(id, 4)
}
