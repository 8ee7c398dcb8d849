//! Inventory REST API Client
//!
//! A Rust client for the IPAM/DNS appliance REST API. Every call is a named
//! operation with ordered form parameters; responses are decoded into flat
//! records that callers turn into typed structs such as [`FreeAddress`].
//!
//! # Example
//!
//! ```no_run
//! use inventory_client::{
//!     FormParams, FreeAddress, InventoryClient, InventoryConfig, RequestMethod,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = InventoryConfig::from_env()?;
//! let client = InventoryClient::new(&config)?;
//! client.validate_credentials().await?;
//!
//! // Ask for free addresses in subnet 12
//! let params = FormParams::new()
//!     .with("subnet_id", "12")
//!     .with("max_find", "4");
//! let response = client
//!     .request(RequestMethod::Get, "rpc/ip_find_free_address", &params)
//!     .await?;
//! let free: Vec<FreeAddress> = response.decode_records("rpc/ip_find_free_address", 4)?;
//! for address in &free {
//!     println!("{}", address.hex);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod common;
pub mod config;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod inventory_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::InventoryClient;
pub use common::{FormParams, RequestMethod};
pub use config::InventoryConfig;
pub use error::InventoryError;
pub use models::{
    FreeAddress, FreeSubnet, FreeVlan, InventoryResponse, IpAddressInfo, Record, SubnetInfo,
};
pub use inventory_trait::InventoryClientTrait;
#[cfg(feature = "test-util")]
pub use mock::{MockInventoryClient, RecordedCall};
