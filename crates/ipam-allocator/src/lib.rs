//! IPAM free-capacity allocation
//!
//! Allocates addresses, subnets, pools and VLAN ids against the inventory
//! API. Free candidates are discovered through the inventory's `rpc/`
//! find-free operations and claimed one by one with `add_flag=new_only`, so
//! a candidate taken concurrently by another allocator is simply skipped.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use inventory_client::{InventoryClient, InventoryConfig};
//! use ipam_allocator::{AddressFamily, IpAddressSpec, Provisioner};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = InventoryConfig::from_env()?;
//! let provisioner = Provisioner::new(Arc::new(InventoryClient::new(&config)?));
//!
//! let record = provisioner
//!     .create_ip_address(&IpAddressSpec {
//!         name: "web01".to_string(),
//!         site_id: "2".to_string(),
//!         subnet_id: "14".to_string(),
//!         family: AddressFamily::V4,
//!         address: None,
//!         mac: None,
//!     })
//!     .await?;
//! println!("{} -> {}", record.id, record.address);
//! # Ok(())
//! # }
//! ```

pub mod attempt;
pub mod codec;
pub mod error;
pub mod finder;
pub mod resources;
pub mod retry;
pub mod scope;

pub use attempt::{Allocation, AllocationAttempt, CreateTarget};
pub use codec::{AddressFamily, BlockSize, Prefix};
pub use error::AllocError;
pub use finder::CandidateFinder;
pub use resources::{
    IpAddressRecord, IpAddressSpec, PoolRecord, PoolSpec, Provisioner, SubnetRecord, SubnetSpec,
    VlanRecord, VlanSpec,
};
pub use retry::DeletionRetry;
pub use scope::{AllocationScope, ParentRef, VlanScope};
