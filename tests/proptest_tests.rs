//! Property-based tests using proptest.
//!
//! Resource id parsing, attribute validation and retry timing are checked
//! against generated inputs.

use azurerm_network::models::{IpAllocationMethod, SecurityRuleResource};
use azurerm_network::network::network_interface::{
    validate_update_attributes, RESTRICTED_ATTRIBUTES,
};
use azurerm_network::network::NetworkSecurityRule;
use azurerm_network::resource_id::{resource_group_from_id, ResourceId};
use azurerm_network::retry::{JitterStrategy, RetryPolicy};
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::time::Duration;

// ============================================================================
// Strategies
// ============================================================================

/// A single id segment as Azure allows in names.
fn segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9][a-zA-Z0-9._-]{0,30}"
}

fn resource_id() -> impl Strategy<Value = ResourceId> {
    (
        segment(),
        prop::option::of(segment()),
        prop::collection::vec((segment(), segment()), 0..3),
        segment(),
        segment(),
    )
        .prop_map(
            |(subscription_id, resource_group, parents, resource_type, name)| ResourceId {
                subscription_id,
                resource_group,
                provider: "Microsoft.Network".to_string(),
                parents,
                resource_type,
                name,
            },
        )
}

// ============================================================================
// Resource ids
// ============================================================================

mod resource_id_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        /// Property: a rendered id parses back to the same value
        #[test]
        fn rendered_ids_parse_back(id in resource_id()) {
            let parsed = ResourceId::parse(&id.to_string()).unwrap();
            prop_assert_eq!(parsed, id);
        }

        /// Property: parsing arbitrary input never panics
        #[test]
        fn parse_never_panics(input in "\\PC{0,200}") {
            let _ = ResourceId::parse(&input);
        }

        /// Property: the resource group shortcut agrees with the full parser
        #[test]
        fn resource_group_shortcut_agrees(id in resource_id()) {
            let rendered = id.to_string();
            if id.resource_group.is_some() {
                prop_assert_eq!(resource_group_from_id(&rendered), id.resource_group);
            }
        }

        /// Property: ids without a leading slash are rejected
        #[test]
        fn relative_ids_are_rejected(id in resource_id()) {
            let rendered = id.to_string();
            prop_assert!(ResourceId::parse(&rendered[1..]).is_err());
        }

        /// Property: a rule knows its group and resource group from its id alone
        #[test]
        fn rule_parent_comes_from_id(
            subscription in segment(),
            resource_group in segment(),
            nsg in segment(),
            name in segment(),
        ) {
            let id = ResourceId::security_rule(&subscription, &resource_group, &nsg, &name);
            let resource = SecurityRuleResource {
                id: Some(id.to_string()),
                name: Some(name.clone()),
                ..Default::default()
            };

            let rule = NetworkSecurityRule::parse(&resource);
            prop_assert_eq!(rule.network_security_group_name, Some(nsg));
            prop_assert_eq!(rule.resource_group, Some(resource_group));
            prop_assert_eq!(rule.name, name);
        }
    }
}

// ============================================================================
// Attribute validation
// ============================================================================

mod attribute_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Property: any restricted attribute makes an update fail, and the
        /// message lists them in a fixed order
        #[test]
        fn restricted_attributes_always_rejected(
            mask in prop::collection::vec(any::<bool>(), RESTRICTED_ATTRIBUTES.len()),
            mutable in prop::collection::vec(
                prop::sample::select(vec!["dns_servers", "private_ip_address", "tags"]),
                0..3,
            ),
        ) {
            let restricted: Vec<&str> = RESTRICTED_ATTRIBUTES
                .iter()
                .zip(&mask)
                .filter(|(_, selected)| **selected)
                .map(|(attribute, _)| *attribute)
                .collect();

            let mut attributes: Map<String, Value> = Map::new();
            for key in mutable.iter().chain(restricted.iter().rev()) {
                attributes.insert(key.to_string(), json!("x"));
            }

            let result = validate_update_attributes(&attributes);
            if restricted.is_empty() {
                prop_assert!(result.is_ok());
            } else {
                let expected = format!("Attributes {} can not be updated.", restricted.join(", "));
                prop_assert_eq!(result.unwrap_err().to_string(), expected);
            }
        }

        /// Property: allocation methods parse whatever their casing
        #[test]
        fn allocation_method_ignores_case(
            upper in prop::collection::vec(any::<bool>(), 7),
            method in prop::sample::select(vec![IpAllocationMethod::Static, IpAllocationMethod::Dynamic]),
        ) {
            let spelled: String = method
                .as_str()
                .chars()
                .zip(upper)
                .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c.to_ascii_lowercase() })
                .collect();
            prop_assert_eq!(spelled.parse::<IpAllocationMethod>().unwrap(), method);
        }
    }
}

// ============================================================================
// Retry timing
// ============================================================================

mod retry_tests {
    use super::*;

    proptest! {
        /// Property: no delay ever exceeds the cap, with or without jitter
        #[test]
        fn delay_is_capped(
            attempt in 0u32..64,
            initial_ms in 1u64..5_000,
            max_ms in 1u64..60_000,
            jitter in prop::sample::select(vec![
                JitterStrategy::None,
                JitterStrategy::Full,
                JitterStrategy::Equal,
            ]),
        ) {
            let max = Duration::from_millis(max_ms);
            let policy = RetryPolicy::exponential(5, Duration::from_millis(initial_ms), max)
                .with_jitter(jitter);
            prop_assert!(policy.delay_for_attempt(attempt) <= max);
        }

        /// Property: without jitter the delay never shrinks between attempts
        #[test]
        fn delay_is_monotonic_without_jitter(attempt in 0u32..32, initial_ms in 1u64..1_000) {
            let policy = RetryPolicy::exponential(
                5,
                Duration::from_millis(initial_ms),
                Duration::from_secs(3600),
            )
            .with_jitter(JitterStrategy::None);
            prop_assert!(policy.delay_for_attempt(attempt) <= policy.delay_for_attempt(attempt + 1));
        }
    }
}
