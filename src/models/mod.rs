//! Serde representations of the ARM JSON bodies.
//!
//! These types mirror the REST payloads of `Microsoft.Network`. Optional
//! fields are skipped on serialization, and keys the crate does not model
//! are kept in `additional` so a read-modify-write cycle does not drop them.

pub mod common;
pub mod express_route;
pub mod network_interface;
pub mod security_rule;

pub use common::{ListResult, SubResource};
pub use express_route::{
    ExpressRouteServiceProviderBandwidthsOffered, ExpressRouteServiceProviderProperties,
    ExpressRouteServiceProviderResource,
};
pub use network_interface::{
    IpConfigurationProperties, NetworkInterfaceDnsSettings, NetworkInterfaceIpConfiguration,
    NetworkInterfaceProperties, NetworkInterfaceResource,
};
pub use security_rule::{SecurityRuleProperties, SecurityRuleResource};

/// Define a string enum with its ARM spelling, case-insensitive parsing and
/// `Display`.
macro_rules! arm_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal $(| $alias:literal)*),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// ARM spelling of the value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::error::Error;

            fn from_str(s: &str) -> crate::error::Result<Self> {
                $(
                    if s.eq_ignore_ascii_case($wire) $(|| s.eq_ignore_ascii_case($alias))* {
                        return Ok(Self::$variant);
                    }
                )+
                Err(crate::error::Error::invalid_attribute(
                    $what,
                    format!(
                        "'{}' is not one of {}",
                        s,
                        [$($wire),+].join(", ")
                    ),
                ))
            }
        }
    };
}

arm_enum! {
    /// How a private IP address is assigned.
    IpAllocationMethod, "private_ip_allocation_method" {
        Static => "Static",
        Dynamic => "Dynamic",
    }
}

arm_enum! {
    /// Network protocol a security rule applies to.
    SecurityRuleProtocol, "protocol" {
        Tcp => "Tcp",
        Udp => "Udp",
        Icmp => "Icmp",
        /// IPsec Encapsulating Security Payload
        Esp => "Esp",
        /// IPsec Authentication Header
        Ah => "Ah",
        /// Any protocol
        Any => "*" | "any",
    }
}

arm_enum! {
    /// Whether matching traffic is allowed.
    SecurityRuleAccess, "access" {
        Allow => "Allow",
        Deny => "Deny",
    }
}

arm_enum! {
    /// Traffic direction a security rule is evaluated for.
    SecurityRuleDirection, "direction" {
        Inbound => "Inbound",
        Outbound => "Outbound",
    }
}
