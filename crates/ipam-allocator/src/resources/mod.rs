//! Resource lifecycle flows.
//!
//! This module is organized by resource type:
//! - `ip_address`: host addresses allocated inside a subnet
//! - `subnet`: subnets carved out of a block, with an optional gateway
//! - `pool`: address ranges reserved inside a subnet
//! - `vlan`: VLAN ids allocated from a VLAN domain
//! - `dns`: DNS server and view removal with retried deletion
//!
//! Creates go through the candidate finder and the allocation attempt loop;
//! reads decode typed info records and normalise them through the codec.

pub mod dns;
pub mod ip_address;
pub mod pool;
pub mod subnet;
pub mod vlan;

use crate::attempt::AllocationAttempt;
use crate::error::AllocError;
use crate::finder::CandidateFinder;
use crate::retry::DeletionRetry;
use inventory_client::{FormParams, InventoryClientTrait, InventoryError, RequestMethod};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info};

pub use ip_address::{IpAddressRecord, IpAddressSpec};
pub use pool::{PoolRecord, PoolSpec};
pub use subnet::{SubnetRecord, SubnetSpec};
pub use vlan::{VlanRecord, VlanSpec};

/// Creates, reads and deletes inventory resources.
#[derive(Clone)]
pub struct Provisioner {
    pub(crate) client: Arc<dyn InventoryClientTrait>,
    pub(crate) finder: CandidateFinder,
    pub(crate) attempt: AllocationAttempt,
    pub(crate) deletion: DeletionRetry,
}

impl std::fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provisioner")
            .field("inventory", &self.client.base_url())
            .field("deletion", &self.deletion)
            .finish()
    }
}

impl Provisioner {
    /// Create a provisioner with the default deletion retry policy
    pub fn new(client: Arc<dyn InventoryClientTrait>) -> Self {
        let deletion = DeletionRetry::new(Arc::clone(&client));
        Self::with_deletion_retry(client, deletion)
    }

    /// Create a provisioner with a custom deletion retry policy
    pub fn with_deletion_retry(
        client: Arc<dyn InventoryClientTrait>,
        deletion: DeletionRetry,
    ) -> Self {
        Self {
            finder: CandidateFinder::new(Arc::clone(&client)),
            attempt: AllocationAttempt::new(Arc::clone(&client)),
            deletion,
            client,
        }
    }

    /// Fetch and decode the single record describing an object
    ///
    /// Returns `None` when the inventory no longer knows the object.
    pub(crate) async fn fetch_record<T: DeserializeOwned>(
        &self,
        operation: &str,
        params: &FormParams,
    ) -> Result<Option<T>, AllocError> {
        let response = self
            .client
            .request(RequestMethod::Get, operation, params)
            .await?;

        if !response.is_usable() {
            debug!(
                "{} found nothing (status {}: {})",
                operation,
                response.status,
                response.error_message().unwrap_or("no error message")
            );
            return Ok(None);
        }

        match response.first() {
            Some(record) => Ok(Some(record.decode(operation)?)),
            None => Ok(None),
        }
    }

    /// Delete an object with a single attempt
    pub(crate) async fn delete_once(
        &self,
        operation: &str,
        params: &FormParams,
        resource: &str,
    ) -> Result<(), AllocError> {
        let response = self
            .client
            .request(RequestMethod::Delete, operation, params)
            .await?;

        if response.status == 200 || response.status == 204 {
            info!("Deleted {}", resource);
            return Ok(());
        }

        Err(AllocError::RemoteUnavailable(InventoryError::Api(format!(
            "Unable to delete {}: {} - {}",
            resource,
            response.status,
            response.error_message().unwrap_or("no error message")
        ))))
    }
}

/// Value of `key` inside an URL-encoded class parameter string
pub(crate) fn class_parameter<'a>(raw: &'a str, key: &str) -> Option<&'a str> {
    raw.split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_parameter() {
        let raw = "owner=ops&gateway=10.0.0.1&empty=";
        assert_eq!(class_parameter(raw, "gateway"), Some("10.0.0.1"));
        assert_eq!(class_parameter(raw, "owner"), Some("ops"));
        assert_eq!(class_parameter(raw, "empty"), None);
        assert_eq!(class_parameter(raw, "missing"), None);
        assert_eq!(class_parameter("", "gateway"), None);
    }
}
