//! Module tests
//!
//! The declarative modules run through the registry against the in-memory
//! service. A `mockall` double of the service checks that dry runs never
//! issue a write.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use azurerm_network::error::Result;
use azurerm_network::models::{
    ExpressRouteServiceProviderResource, NetworkInterfaceResource, SecurityRuleResource,
};
use azurerm_network::modules::{ModuleContext, ModuleError, ModuleRegistry, ModuleStatus};
use azurerm_network::network::{NetworkInterfaces, NetworkSecurityRules};
use azurerm_network::service::mock::{
    MOCK_NETWORK_INTERFACE, MOCK_NETWORK_SECURITY_GROUP, MOCK_RESOURCE_GROUP, MOCK_SECURITY_RULE,
};
use azurerm_network::service::{
    MockNetworkService, NetworkInterfaceParams, NetworkService, NicResource, SecurityRuleParams,
};
use common::*;
use mockall::mock;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const NIC: &str = "azure_network_interface";
const RULE: &str = "azure_security_rule";
const PROVIDERS: &str = "azure_express_route_provider_info";

fn context() -> (Arc<dyn NetworkService>, ModuleContext) {
    let service: Arc<dyn NetworkService> = Arc::new(MockNetworkService::new());
    let context = ModuleContext::new(service.clone());
    (service, context)
}

fn seeded_nic(extra: &[(&str, Value)]) -> azurerm_network::modules::ModuleParams {
    let mut p = params(&[
        ("name", json!(MOCK_NETWORK_INTERFACE)),
        ("resource_group", json!(MOCK_RESOURCE_GROUP)),
    ]);
    p.extend(params(extra));
    p
}

fn seeded_rule(extra: &[(&str, Value)]) -> azurerm_network::modules::ModuleParams {
    let mut p = params(&[
        ("name", json!(MOCK_SECURITY_RULE)),
        ("resource_group", json!(MOCK_RESOURCE_GROUP)),
        ("network_security_group_name", json!(MOCK_NETWORK_SECURITY_GROUP)),
    ]);
    p.extend(params(extra));
    p
}

// ============================================================================
// Registry
// ============================================================================

#[test]
fn test_builtin_modules() {
    let registry = ModuleRegistry::with_builtins();
    assert_eq!(registry.names(), vec![PROVIDERS, NIC, RULE]);
}

#[tokio::test]
async fn test_unknown_module() {
    let (_, context) = context();
    let err = ModuleRegistry::with_builtins()
        .execute("azure_load_balancer", &params(&[]), &context)
        .await
        .unwrap_err();
    assert!(matches!(err, ModuleError::NotFound(ref name) if name == "azure_load_balancer"));
}

#[tokio::test]
async fn test_required_parameters_are_checked() {
    let (_, context) = context();
    let err = ModuleRegistry::with_builtins()
        .execute(NIC, &params(&[("name", json!("nic"))]), &context)
        .await
        .unwrap_err();
    assert!(matches!(err, ModuleError::MissingParameter(ref p) if p == "resource_group"));
}

#[tokio::test]
async fn test_invalid_state_is_rejected() {
    let (_, context) = context();
    let err = ModuleRegistry::with_builtins()
        .execute(NIC, &seeded_nic(&[("state", json!("maybe"))]), &context)
        .await
        .unwrap_err();
    assert!(matches!(err, ModuleError::InvalidParameter(_)));
}

// ============================================================================
// azure_network_interface
// ============================================================================

#[tokio::test]
async fn test_nic_create() {
    let (service, context) = context();
    let p = params(&[
        ("name", json!("web-nic")),
        ("resource_group", json!(MOCK_RESOURCE_GROUP)),
        ("location", json!("eastus")),
        ("subnet_id", json!(subnet_id("vnet", "default"))),
        ("tags", json!({ "env": "test" })),
    ]);

    let output = ModuleRegistry::with_builtins()
        .execute(NIC, &p, &context)
        .await
        .unwrap();

    assert!(output.changed);
    assert_eq!(output.status, ModuleStatus::Changed);
    assert_eq!(
        output.msg,
        "Created network interface 'web-nic' in resource group 'fog-test-rg'"
    );
    let nic = &output.data["network_interface"];
    assert_eq!(nic["ip_configuration_name"], json!("ipconfig1"));
    assert_eq!(nic["private_ip_allocation_method"], json!("Dynamic"));
    assert_eq!(nic["tags"], json!({ "env": "test" }));

    assert!(NetworkInterfaces::new(service)
        .exists(MOCK_RESOURCE_GROUP, "web-nic")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_nic_create_requires_location() {
    let (_, context) = context();
    let p = params(&[
        ("name", json!("web-nic")),
        ("resource_group", json!(MOCK_RESOURCE_GROUP)),
        ("subnet_id", json!(subnet_id("vnet", "default"))),
    ]);

    let err = ModuleRegistry::with_builtins()
        .execute(NIC, &p, &context)
        .await
        .unwrap_err();
    assert!(matches!(err, ModuleError::MissingParameter(ref p) if p == "location"));
}

#[tokio::test]
async fn test_nic_create_in_check_mode() {
    let (service, context) = context();
    let context = context.with_check_mode(true);
    let p = params(&[
        ("name", json!("web-nic")),
        ("resource_group", json!(MOCK_RESOURCE_GROUP)),
        ("location", json!("eastus")),
        ("subnet_id", json!(subnet_id("vnet", "default"))),
    ]);

    let output = ModuleRegistry::with_builtins()
        .execute(NIC, &p, &context)
        .await
        .unwrap();

    assert!(output.changed);
    assert!(output.msg.starts_with("Would create network interface 'web-nic'"));
    assert_eq!(output.data["action"], json!("create"));
    assert!(!NetworkInterfaces::new(service)
        .exists(MOCK_RESOURCE_GROUP, "web-nic")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_nic_up_to_date() {
    let (_, context) = context();
    let output = ModuleRegistry::with_builtins()
        .execute(
            NIC,
            &seeded_nic(&[("private_ip_allocation_method", json!("dynamic"))]),
            &context,
        )
        .await
        .unwrap();

    assert!(!output.changed);
    assert_eq!(output.status, ModuleStatus::Ok);
    assert_eq!(
        output.msg,
        format!("Network interface '{MOCK_NETWORK_INTERFACE}' is up to date")
    );
}

#[tokio::test]
async fn test_nic_update_attaches_and_sets_dns() {
    let (service, context) = context();
    let pip = public_ip_id("web-pip");

    let output = ModuleRegistry::with_builtins()
        .execute(
            NIC,
            &seeded_nic(&[
                ("public_ip_address_id", json!(pip)),
                ("dns_servers", json!(["10.1.0.4"])),
            ]),
            &context,
        )
        .await
        .unwrap();

    assert!(output.changed);
    assert_eq!(
        output.data["changes"],
        json!(["public_ip_address_id", "dns_servers"])
    );

    let nic = NetworkInterfaces::new(service)
        .get(MOCK_RESOURCE_GROUP, MOCK_NETWORK_INTERFACE)
        .await
        .unwrap();
    assert_eq!(nic.public_ip_address_id.as_deref(), Some(pip.as_str()));
    assert_eq!(nic.dns_servers, vec!["10.1.0.4"]);
}

#[tokio::test]
async fn test_nic_null_reference_detaches() {
    let (service, context) = context();
    let nsg = nsg_id("web-nsg");
    service
        .attach_resource_to_nic(
            MOCK_RESOURCE_GROUP,
            MOCK_NETWORK_INTERFACE,
            NicResource::NetworkSecurityGroup,
            &nsg,
        )
        .await
        .unwrap();

    // Ids compare without regard to case
    let same = ModuleRegistry::with_builtins()
        .execute(
            NIC,
            &seeded_nic(&[("network_security_group_id", json!(nsg.to_uppercase()))]),
            &context,
        )
        .await
        .unwrap();
    assert!(!same.changed);

    let output = ModuleRegistry::with_builtins()
        .execute(
            NIC,
            &seeded_nic(&[("network_security_group_id", Value::Null)]),
            &context,
        )
        .await
        .unwrap();
    assert!(output.changed);

    let nic = NetworkInterfaces::new(service)
        .get(MOCK_RESOURCE_GROUP, MOCK_NETWORK_INTERFACE)
        .await
        .unwrap();
    assert_eq!(nic.network_security_group_id, None);
}

#[tokio::test]
async fn test_nic_static_address_in_diff_mode() {
    let (_, context) = context();
    let context = context.with_diff_mode(true);

    let output = ModuleRegistry::with_builtins()
        .execute(
            NIC,
            &seeded_nic(&[("private_ip_address", json!("10.0.0.50"))]),
            &context,
        )
        .await
        .unwrap();

    let diff = output.diff.expect("diff");
    assert_eq!(
        diff.details.as_deref(),
        Some("private_ip_allocation_method, private_ip_address")
    );
    assert!(diff.before.contains("10.0.0.4"));
    assert!(diff.after.contains("10.0.0.50"));
    assert!(diff.after.contains("Static"));
    assert_eq!(
        output.data["network_interface"]["private_ip_address"],
        json!("10.0.0.50")
    );
}

#[tokio::test]
async fn test_nic_absent() {
    let (_, context) = context();
    let registry = ModuleRegistry::with_builtins();
    let p = seeded_nic(&[("state", json!("absent"))]);

    let checked = registry
        .execute(NIC, &p, &context.clone().with_check_mode(true))
        .await
        .unwrap();
    assert_eq!(checked.data["action"], json!("delete"));

    let deleted = registry.execute(NIC, &p, &context).await.unwrap();
    assert!(deleted.changed);
    assert_eq!(
        deleted.msg,
        format!("Deleted network interface '{MOCK_NETWORK_INTERFACE}'")
    );

    let again = registry.execute(NIC, &p, &context).await.unwrap();
    assert!(!again.changed);
}

// ============================================================================
// azure_security_rule
// ============================================================================

#[tokio::test]
async fn test_rule_create_with_defaults() {
    let (_, context) = context();
    let p = params(&[
        ("name", json!("allow-all")),
        ("resource_group", json!(MOCK_RESOURCE_GROUP)),
        ("network_security_group_name", json!(MOCK_NETWORK_SECURITY_GROUP)),
        ("priority", json!(300)),
    ]);

    let output = ModuleRegistry::with_builtins()
        .execute(RULE, &p, &context)
        .await
        .unwrap();

    assert!(output.changed);
    let rule = &output.data["security_rule"];
    assert_eq!(rule["protocol"], json!("*"));
    assert_eq!(rule["source_port_range"], json!("*"));
    assert_eq!(rule["destination_address_prefix"], json!("*"));
    assert_eq!(rule["access"], json!("Allow"));
    assert_eq!(rule["direction"], json!("Inbound"));
    assert_eq!(rule["priority"], json!(300));
}

#[tokio::test]
async fn test_rule_create_requires_priority() {
    let (_, context) = context();
    let p = params(&[
        ("name", json!("allow-all")),
        ("resource_group", json!(MOCK_RESOURCE_GROUP)),
        ("network_security_group_name", json!(MOCK_NETWORK_SECURITY_GROUP)),
    ]);

    let err = ModuleRegistry::with_builtins()
        .execute(RULE, &p, &context)
        .await
        .unwrap_err();
    assert!(matches!(err, ModuleError::MissingParameter(ref p) if p == "priority"));
}

#[tokio::test]
async fn test_rule_update_keeps_unset_fields() {
    let (service, context) = context();
    let output = ModuleRegistry::with_builtins()
        .execute(
            RULE,
            &seeded_rule(&[("destination_port_range", json!("2222"))]),
            &context,
        )
        .await
        .unwrap();

    assert!(output.changed);
    assert_eq!(output.data["changes"], json!(["destination_port_range"]));

    let rule = NetworkSecurityRules::new(service)
        .get(MOCK_RESOURCE_GROUP, MOCK_NETWORK_SECURITY_GROUP, MOCK_SECURITY_RULE)
        .await
        .unwrap();
    assert_eq!(rule.destination_port_range.as_deref(), Some("2222"));
    assert_eq!(rule.source_port_range.as_deref(), Some("22"));
    assert_eq!(rule.priority, Some(100));
}

#[tokio::test]
async fn test_rule_invalid_priority_fails_before_write() {
    let (_, context) = context();
    let err = ModuleRegistry::with_builtins()
        .execute(RULE, &seeded_rule(&[("priority", json!(5000))]), &context)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("priority"));
}

#[tokio::test]
async fn test_rule_absent_in_check_mode() {
    let (service, context) = context();
    let output = ModuleRegistry::with_builtins()
        .execute(
            RULE,
            &seeded_rule(&[("state", json!("absent"))]),
            &context.with_check_mode(true),
        )
        .await
        .unwrap();

    assert_eq!(
        output.msg,
        format!("Would delete security rule '{MOCK_SECURITY_RULE}'")
    );
    assert!(NetworkSecurityRules::new(service)
        .exists(MOCK_RESOURCE_GROUP, MOCK_NETWORK_SECURITY_GROUP, MOCK_SECURITY_RULE)
        .await
        .unwrap());
}

// ============================================================================
// azure_express_route_provider_info
// ============================================================================

#[tokio::test]
async fn test_provider_info() {
    let (_, context) = context();
    let registry = ModuleRegistry::with_builtins();

    let all = registry.execute(PROVIDERS, &params(&[]), &context).await.unwrap();
    assert!(!all.changed);
    assert_eq!(all.data["count"], json!(1));
    assert_eq!(all.data["providers"][0]["name"], json!("providername"));

    let named = registry
        .execute(PROVIDERS, &params(&[("name", json!("PROVIDERNAME"))]), &context)
        .await
        .unwrap();
    assert_eq!(named.data["count"], json!(1));

    let missing = registry
        .execute(PROVIDERS, &params(&[("name", json!("nope"))]), &context)
        .await
        .unwrap();
    assert_eq!(missing.data["count"], json!(0));
}

// ============================================================================
// Dry runs never write
// ============================================================================

mock! {
    pub Service {}

    #[async_trait]
    impl NetworkService for Service {
        async fn create_or_update_network_interface(
            &self,
            params: &NetworkInterfaceParams,
        ) -> Result<NetworkInterfaceResource>;
        async fn attach_resource_to_nic(
            &self,
            resource_group: &str,
            name: &str,
            resource: NicResource,
            resource_id: &str,
        ) -> Result<NetworkInterfaceResource>;
        async fn detach_resource_from_nic(
            &self,
            resource_group: &str,
            name: &str,
            resource: NicResource,
        ) -> Result<NetworkInterfaceResource>;
        async fn delete_network_interface(&self, resource_group: &str, name: &str) -> Result<bool>;
        async fn get_network_interface(
            &self,
            resource_group: &str,
            name: &str,
        ) -> Result<NetworkInterfaceResource>;
        async fn list_network_interfaces(
            &self,
            resource_group: &str,
        ) -> Result<Vec<NetworkInterfaceResource>>;
        async fn list_all_network_interfaces(&self) -> Result<Vec<NetworkInterfaceResource>>;
        async fn network_interface_exists(&self, resource_group: &str, name: &str) -> Result<bool>;
        async fn create_or_update_network_security_rule(
            &self,
            params: &SecurityRuleParams,
        ) -> Result<SecurityRuleResource>;
        async fn get_network_security_rule(
            &self,
            resource_group: &str,
            network_security_group_name: &str,
            name: &str,
        ) -> Result<SecurityRuleResource>;
        async fn list_network_security_rules(
            &self,
            resource_group: &str,
            network_security_group_name: &str,
        ) -> Result<Vec<SecurityRuleResource>>;
        async fn delete_network_security_rule(
            &self,
            resource_group: &str,
            network_security_group_name: &str,
            name: &str,
        ) -> Result<bool>;
        async fn network_security_rule_exists(
            &self,
            resource_group: &str,
            network_security_group_name: &str,
            name: &str,
        ) -> Result<bool>;
        async fn list_express_route_service_providers(
            &self,
        ) -> Result<Vec<ExpressRouteServiceProviderResource>>;
    }
}

fn read_only_service() -> MockService {
    let mut service = MockService::new();
    service.expect_create_or_update_network_interface().never();
    service.expect_attach_resource_to_nic().never();
    service.expect_detach_resource_from_nic().never();
    service.expect_delete_network_interface().never();
    service.expect_create_or_update_network_security_rule().never();
    service.expect_delete_network_security_rule().never();
    service
}

#[tokio::test]
async fn test_check_mode_nic_update_makes_no_writes() {
    let mut service = read_only_service();
    let nic: NetworkInterfaceResource = serde_json::from_value(nic_json("nic1")).unwrap();

    service
        .expect_network_interface_exists()
        .times(1)
        .returning(|_, _| Ok(true));
    service
        .expect_get_network_interface()
        .times(1)
        .returning(move |_, _| Ok(nic.clone()));

    let context = ModuleContext::new(Arc::new(service)).with_check_mode(true);
    let p = params(&[
        ("name", json!("nic1")),
        ("resource_group", json!(RESOURCE_GROUP)),
        ("public_ip_address_id", json!(public_ip_id("pip1"))),
        ("dns_servers", json!(["10.1.0.4"])),
    ]);

    let output = ModuleRegistry::with_builtins()
        .execute(NIC, &p, &context)
        .await
        .unwrap();

    assert!(output.changed);
    assert_eq!(output.msg, "Would update network interface 'nic1'");
    assert_eq!(output.data["action"], json!("update"));
}

#[tokio::test]
async fn test_check_mode_rule_update_makes_no_writes() {
    let mut service = read_only_service();
    let rule: SecurityRuleResource =
        serde_json::from_value(rule_json("web-nsg", "ssh", 100)).unwrap();

    service
        .expect_network_security_rule_exists()
        .times(1)
        .returning(|_, _, _| Ok(true));
    service
        .expect_get_network_security_rule()
        .times(1)
        .returning(move |_, _, _| Ok(rule.clone()));

    let context = ModuleContext::new(Arc::new(service)).with_check_mode(true);
    let p = params(&[
        ("name", json!("ssh")),
        ("resource_group", json!(RESOURCE_GROUP)),
        ("network_security_group_name", json!("web-nsg")),
        ("access", json!("Deny")),
    ]);

    let output = ModuleRegistry::with_builtins()
        .execute(RULE, &p, &context)
        .await
        .unwrap();

    assert_eq!(output.msg, "Would update security rule 'ssh'");
    assert_eq!(output.data["changes"], json!(["access"]));
}
