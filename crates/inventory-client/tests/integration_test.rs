//! Integration tests for the inventory client
//!
//! These tests require a reachable appliance.
//! Set INVENTORY_URL, INVENTORY_USERNAME and INVENTORY_PASSWORD to run.

use inventory_client::{FormParams, FreeAddress, InventoryClient, InventoryConfig, RequestMethod};

fn client_from_env() -> InventoryClient {
    let config = InventoryConfig::from_env()
        .expect("INVENTORY_URL, INVENTORY_USERNAME and INVENTORY_PASSWORD must be set");
    InventoryClient::new(&config).expect("Failed to create client")
}

#[tokio::test]
#[ignore] // Requires a reachable appliance
async fn test_validate_credentials() {
    let client = client_from_env();
    let result = client.validate_credentials().await;
    assert!(result.is_ok(), "Failed to validate credentials: {:?}", result.err());
}

#[tokio::test]
#[ignore]
async fn test_list_sites() {
    let client = client_from_env();

    let params = FormParams::new().with("limit", "10");
    let response = client
        .request(RequestMethod::Get, "rest/ip_site_list", &params)
        .await
        .expect("Failed to list sites");

    println!("Found {} sites (status {})", response.records.len(), response.status);
}

#[tokio::test]
#[ignore]
async fn test_find_free_addresses() {
    let client = client_from_env();
    let subnet_id = std::env::var("INVENTORY_SUBNET_ID")
        .expect("INVENTORY_SUBNET_ID environment variable must be set");

    let params = FormParams::new()
        .with("subnet_id", subnet_id)
        .with("max_find", "4");
    let response = client
        .request(RequestMethod::Get, "rpc/ip_find_free_address", &params)
        .await
        .expect("Failed to query free addresses");

    assert!(response.records.len() <= 4);
    let free: Vec<FreeAddress> = response
        .decode_records("rpc/ip_find_free_address", 4)
        .expect("Free addresses should decode");
    for address in &free {
        println!("Free address: {}", address.hex);
    }
}
