//! Network interface tests
//!
//! The model and collection run against the in-memory service; the request
//! bodies the real service sends are checked against a `wiremock` server.

mod common;

use std::sync::Arc;

use azurerm_network::error::Error;
use azurerm_network::models::IpAllocationMethod;
use azurerm_network::network::{NetworkInterface, NetworkInterfaces};
use azurerm_network::service::mock::{
    MOCK_NETWORK_INTERFACE, MOCK_RESOURCE_GROUP, MOCK_SUBSCRIPTION_ID,
};
use azurerm_network::service::{MockNetworkService, NetworkService, NicResource};
use common::*;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn mock_service() -> Arc<dyn NetworkService> {
    Arc::new(MockNetworkService::new())
}

fn new_nic(name: &str) -> NetworkInterface {
    let mut nic = NetworkInterface::new(name);
    nic.resource_group = Some(MOCK_RESOURCE_GROUP.to_string());
    nic.location = Some("eastus".to_string());
    nic.subnet_id = Some(subnet_id("vnet", "default"));
    nic.ip_configuration_name = Some("ipconfig1".to_string());
    nic.private_ip_allocation_method = Some(IpAllocationMethod::Dynamic);
    nic
}

fn put_bodies(requests: &[Request]) -> Vec<Value> {
    requests
        .iter()
        .filter(|r| r.method.as_str() == "PUT")
        .map(|r| serde_json::from_slice(&r.body).expect("json body"))
        .collect()
}

// ============================================================================
// Collection
// ============================================================================

#[tokio::test]
async fn test_get_seeded_network_interface() {
    let nics = NetworkInterfaces::new(mock_service());
    let nic = nics
        .get(MOCK_RESOURCE_GROUP, MOCK_NETWORK_INTERFACE)
        .await
        .unwrap();

    assert_eq!(nic.name, MOCK_NETWORK_INTERFACE);
    assert_eq!(nic.resource_group.as_deref(), Some(MOCK_RESOURCE_GROUP));
    assert_eq!(nic.location.as_deref(), Some("westus"));
    assert_eq!(
        nic.ip_configuration_name.as_deref(),
        Some("fog-test-ip-configuration")
    );
    assert_eq!(nic.private_ip_allocation_method, Some(IpAllocationMethod::Dynamic));
    assert_eq!(nic.private_ip_address.as_deref(), Some("10.0.0.4"));
    assert!(nic
        .id
        .as_deref()
        .unwrap()
        .starts_with(&format!("/subscriptions/{MOCK_SUBSCRIPTION_ID}/")));
}

#[tokio::test]
async fn test_get_missing_network_interface() {
    let nics = NetworkInterfaces::new(mock_service());
    let err = nics.get(MOCK_RESOURCE_GROUP, "nope").await.unwrap_err();

    assert!(err.is_not_found());
    assert!(!nics.exists(MOCK_RESOURCE_GROUP, "nope").await.unwrap());
}

#[tokio::test]
async fn test_list_by_resource_group_and_subscription() {
    let service = mock_service();
    let mut other = new_nic("other-nic");
    other.resource_group = Some("other-rg".to_string());
    other.save(service.as_ref()).await.unwrap();

    let nics = NetworkInterfaces::new(service);
    let in_group = nics.all(MOCK_RESOURCE_GROUP).await.unwrap();
    let everywhere = nics.all_in_subscription().await.unwrap();

    assert_eq!(in_group.len(), 1);
    assert_eq!(everywhere.len(), 2);
    assert_eq!(everywhere[1].resource_group.as_deref(), Some("other-rg"));
}

// ============================================================================
// Create, update, delete
// ============================================================================

#[tokio::test]
async fn test_save_creates_network_interface() {
    let service = mock_service();
    let mut nic = new_nic("web-nic");
    nic.tags.insert("env".to_string(), "test".to_string());
    nic.save(service.as_ref()).await.unwrap();

    assert!(nic.id.is_some());
    assert_eq!(nic.private_ip_address.as_deref(), Some("10.0.0.5"));
    assert_eq!(nic.tags.get("env").map(String::as_str), Some("test"));
    assert!(NetworkInterfaces::new(service)
        .exists(MOCK_RESOURCE_GROUP, "web-nic")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_save_requires_subnet() {
    let mut nic = new_nic("web-nic");
    nic.subnet_id = None;

    let err = nic.save(mock_service().as_ref()).await.unwrap_err();
    assert!(matches!(err, Error::MissingAttribute(ref a) if a == "subnet_id"));
}

#[tokio::test]
async fn test_update_mutable_attributes() {
    let service = mock_service();
    let mut nic = NetworkInterfaces::new(service.clone())
        .get(MOCK_RESOURCE_GROUP, MOCK_NETWORK_INTERFACE)
        .await
        .unwrap();

    let attributes = json!({
        "private_ip_allocation_method": "Static",
        "private_ip_address": "10.0.0.20",
        "dns_servers": ["10.1.0.4", "10.1.0.5"]
    });
    nic.update(service.as_ref(), attributes.as_object().unwrap())
        .await
        .unwrap();

    assert_eq!(nic.private_ip_allocation_method, Some(IpAllocationMethod::Static));
    assert_eq!(nic.private_ip_address.as_deref(), Some("10.0.0.20"));
    assert_eq!(nic.dns_servers, vec!["10.1.0.4", "10.1.0.5"]);
    assert_eq!(nic.applied_dns_servers, vec!["10.1.0.4", "10.1.0.5"]);
}

#[tokio::test]
async fn test_update_rejects_restricted_attributes() {
    let service = mock_service();
    let mut nic = NetworkInterfaces::new(service.clone())
        .get(MOCK_RESOURCE_GROUP, MOCK_NETWORK_INTERFACE)
        .await
        .unwrap();
    let before = nic.clone();

    let attributes = json!({
        "ip_configuration_id": "/other",
        "dns_servers": ["10.1.0.4"],
        "resource_group": "elsewhere",
        "id": "/other"
    });
    let err = nic
        .update(service.as_ref(), attributes.as_object().unwrap())
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Attributes id, resource_group, ip_configuration_id can not be updated."
    );
    assert_eq!(nic, before);
}

#[tokio::test]
async fn test_destroy() {
    let service = mock_service();
    let nic = NetworkInterfaces::new(service.clone())
        .get(MOCK_RESOURCE_GROUP, MOCK_NETWORK_INTERFACE)
        .await
        .unwrap();

    assert!(nic.destroy(service.as_ref()).await.unwrap());
    assert!(!nic.destroy(service.as_ref()).await.unwrap());
}

// ============================================================================
// Attach and detach
// ============================================================================

#[tokio::test]
async fn test_attach_and_detach_public_ip() {
    let service = mock_service();
    let mut nic = NetworkInterfaces::new(service.clone())
        .get(MOCK_RESOURCE_GROUP, MOCK_NETWORK_INTERFACE)
        .await
        .unwrap();
    let pip = public_ip_id("web-pip");

    nic.attach_public_ip(service.as_ref(), &pip).await.unwrap();
    assert_eq!(nic.public_ip_address_id.as_deref(), Some(pip.as_str()));
    // Address is kept across updates
    assert_eq!(nic.private_ip_address.as_deref(), Some("10.0.0.4"));

    nic.detach_public_ip(service.as_ref()).await.unwrap();
    assert_eq!(nic.public_ip_address_id, None);
}

#[tokio::test]
async fn test_attach_and_detach_network_security_group() {
    let service = mock_service();
    let mut nic = NetworkInterfaces::new(service.clone())
        .get(MOCK_RESOURCE_GROUP, MOCK_NETWORK_INTERFACE)
        .await
        .unwrap();
    let nsg = nsg_id("web-nsg");

    nic.attach_network_security_group(service.as_ref(), &nsg)
        .await
        .unwrap();
    assert_eq!(nic.network_security_group_id.as_deref(), Some(nsg.as_str()));

    nic.detach_network_security_group(service.as_ref())
        .await
        .unwrap();
    assert_eq!(nic.network_security_group_id, None);
}

#[tokio::test]
async fn test_attach_subnet() {
    let service = mock_service();
    let mut nic = NetworkInterfaces::new(service.clone())
        .get(MOCK_RESOURCE_GROUP, MOCK_NETWORK_INTERFACE)
        .await
        .unwrap();
    let subnet = subnet_id("vnet", "backend");

    nic.attach_subnet(service.as_ref(), &subnet).await.unwrap();
    assert_eq!(nic.subnet_id.as_deref(), Some(subnet.as_str()));
}

#[tokio::test]
async fn test_attach_empty_ids_are_rejected() {
    let service = mock_service();
    let mut nic = NetworkInterfaces::new(service.clone())
        .get(MOCK_RESOURCE_GROUP, MOCK_NETWORK_INTERFACE)
        .await
        .unwrap();

    let err = nic.attach_subnet(service.as_ref(), "").await.unwrap_err();
    assert!(err.to_string().contains("Subnet ID can not be nil."));

    let err = nic.attach_public_ip(service.as_ref(), "").await.unwrap_err();
    assert!(err.to_string().contains("Public-IP ID can not be nil."));

    let err = nic
        .attach_network_security_group(service.as_ref(), "")
        .await
        .unwrap_err();
    assert!(err
        .to_string()
        .contains("Network-Security-Group ID can not be nil."));
}

#[tokio::test]
async fn test_detach_when_nothing_attached() {
    let service = mock_service();
    let mut nic = NetworkInterfaces::new(service.clone())
        .get(MOCK_RESOURCE_GROUP, MOCK_NETWORK_INTERFACE)
        .await
        .unwrap();

    let err = nic.detach_public_ip(service.as_ref()).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        format!(
            "Error detaching Public IP. No Public IP is attached to Network Interface {MOCK_NETWORK_INTERFACE}"
        )
    );

    let err = nic
        .detach_network_security_group(service.as_ref())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
}

#[tokio::test]
async fn test_service_refuses_to_detach_subnet() {
    let service = MockNetworkService::new();
    let err = service
        .detach_resource_from_nic(MOCK_RESOURCE_GROUP, MOCK_NETWORK_INTERFACE, NicResource::Subnet)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidAttribute { ref attribute, .. } if attribute == "subnet_id"));
}

// ============================================================================
// Wire format
// ============================================================================

#[tokio::test]
async fn test_create_sends_single_ip_configuration() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(nic_path("nic1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(nic_json("nic1")))
        .expect(1)
        .mount(&server)
        .await;

    let service = network_service(&server);
    let mut nic = new_nic("nic1");
    nic.resource_group = Some(RESOURCE_GROUP.to_string());
    nic.network_security_group_id = Some(nsg_id("nsg1"));
    nic.dns_servers = vec!["8.8.8.8".to_string()];
    nic.save(&service).await.unwrap();

    let bodies = put_bodies(&server.received_requests().await.unwrap());
    assert_eq!(
        bodies[0],
        json!({
            "name": "nic1",
            "location": "eastus",
            "properties": {
                "networkSecurityGroup": { "id": nsg_id("nsg1") },
                "ipConfigurations": [{
                    "name": "ipconfig1",
                    "properties": {
                        "subnet": { "id": subnet_id("vnet", "default") },
                        "privateIPAllocationMethod": "Dynamic"
                    }
                }],
                "dnsSettings": { "dnsServers": ["8.8.8.8"] }
            }
        })
    );

    // The model now reflects what Azure returned
    assert_eq!(nic.location.as_deref(), Some("westus"));
    assert_eq!(nic.private_ip_address.as_deref(), Some("10.0.0.4"));
    assert_eq!(nic.mac_address.as_deref(), Some("00-0D-3A-1B-C7-21"));
}

#[tokio::test]
async fn test_attach_public_ip_reads_then_writes() {
    let server = MockServer::start().await;
    let pip = public_ip_id("pip1");

    let mut attached = nic_json("nic1");
    attached["properties"]["ipConfigurations"][0]["properties"]["publicIPAddress"] =
        json!({ "id": pip });

    Mock::given(method("GET"))
        .and(path(nic_path("nic1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(nic_json("nic1")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(nic_path("nic1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(attached))
        .expect(1)
        .mount(&server)
        .await;

    let service = network_service(&server);
    let nic = service
        .attach_resource_to_nic(RESOURCE_GROUP, "nic1", NicResource::PublicIp, &pip)
        .await
        .unwrap();
    let parsed = NetworkInterface::parse(&nic);
    assert_eq!(parsed.public_ip_address_id.as_deref(), Some(pip.as_str()));

    let bodies = put_bodies(&server.received_requests().await.unwrap());
    let sent = &bodies[0]["properties"];
    assert_eq!(
        sent["ipConfigurations"][0]["properties"]["publicIPAddress"]["id"],
        json!(pip)
    );
    // Fields Azure returned but the crate does not model survive the round trip
    assert_eq!(sent["enableAcceleratedNetworking"], json!(false));
    assert_eq!(sent["ipConfigurations"][0]["properties"]["privateIPAddress"], json!("10.0.0.4"));
}

#[tokio::test]
async fn test_update_keeps_settings_it_does_not_change() {
    let server = MockServer::start().await;
    let mut current = nic_json("nic1");
    current["properties"]["enableIPForwarding"] = json!(true);
    current["properties"]["enableAcceleratedNetworking"] = json!(true);
    current["properties"]["nicType"] = json!("Standard");

    Mock::given(method("GET"))
        .and(path(nic_path("nic1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(current.clone()))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(nic_path("nic1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(current))
        .expect(1)
        .mount(&server)
        .await;

    let service = network_service(&server);
    let nics = NetworkInterfaces::new(Arc::new(network_service(&server)));
    let mut nic = nics.get(RESOURCE_GROUP, "nic1").await.unwrap();

    let mut attributes = serde_json::Map::new();
    attributes.insert("dns_servers".to_string(), json!(["10.1.0.4"]));
    nic.update(&service, &attributes).await.unwrap();

    let bodies = put_bodies(&server.received_requests().await.unwrap());
    let sent = &bodies[0]["properties"];
    assert_eq!(sent["dnsSettings"]["dnsServers"], json!(["10.1.0.4"]));
    assert_eq!(sent["enableIPForwarding"], json!(true));
    assert_eq!(sent["enableAcceleratedNetworking"], json!(true));
    assert_eq!(sent["nicType"], json!("Standard"));
    assert_eq!(
        sent["ipConfigurations"][0]["properties"]["subnet"]["id"],
        json!(subnet_id("vnet", "default"))
    );
}

#[tokio::test]
async fn test_detach_network_security_group_clears_reference() {
    let server = MockServer::start().await;
    let mut with_nsg = nic_json("nic1");
    with_nsg["properties"]["networkSecurityGroup"] = json!({ "id": nsg_id("nsg1") });

    Mock::given(method("GET"))
        .and(path(nic_path("nic1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(with_nsg))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(nic_path("nic1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(nic_json("nic1")))
        .mount(&server)
        .await;

    let service = network_service(&server);
    service
        .detach_resource_from_nic(RESOURCE_GROUP, "nic1", NicResource::NetworkSecurityGroup)
        .await
        .unwrap();

    let bodies = put_bodies(&server.received_requests().await.unwrap());
    assert!(bodies[0]["properties"].get("networkSecurityGroup").is_none());
}

#[tokio::test]
async fn test_create_failure_carries_context() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(nic_path("nic1")))
        .respond_with(ResponseTemplate::new(400).set_body_json(arm_error(
            "InvalidResourceReference",
            "Subnet default referenced by resource nic1 was not found.",
        )))
        .mount(&server)
        .await;

    let service = network_service(&server);
    let mut nic = new_nic("nic1");
    nic.resource_group = Some(RESOURCE_GROUP.to_string());
    let err = nic.save(&service).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        format!(
            "Creating/Updating Network Interface nic1 in Resource Group {RESOURCE_GROUP}. Exception: InvalidResourceReference: Subnet default referenced by resource nic1 was not found."
        )
    );
}
