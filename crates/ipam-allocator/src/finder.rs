//! Candidate finder.
//!
//! Asks the inventory for a short list of currently free addresses, subnet
//! bases or VLAN ids. Candidates are only hints: nothing is reserved until a
//! create call succeeds, and nothing here is cached.

use crate::codec::{self, AddressFamily};
use crate::error::AllocError;
use crate::scope::{AllocationScope, VlanScope};
use inventory_client::{
    FormParams, FreeAddress, FreeSubnet, FreeVlan, InventoryClientTrait, InventoryError,
    InventoryResponse, RequestMethod,
};
use std::sync::Arc;
use tracing::debug;

/// Maximum number of address or VLAN candidates requested per query
pub const MAX_CANDIDATES: usize = 4;

/// Queries the inventory for free capacity
#[derive(Clone)]
pub struct CandidateFinder {
    client: Arc<dyn InventoryClientTrait>,
}

impl std::fmt::Debug for CandidateFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateFinder")
            .field("inventory", &self.client.base_url())
            .finish()
    }
}

impl CandidateFinder {
    pub fn new(client: Arc<dyn InventoryClientTrait>) -> Self {
        Self { client }
    }

    /// Run a find-free operation
    ///
    /// A non-2xx status or an `errmsg` record means "nothing free" and comes
    /// back as `None`.
    async fn query(
        &self,
        operation: &str,
        params: &FormParams,
    ) -> Result<Option<InventoryResponse>, AllocError> {
        let response = self
            .client
            .request(RequestMethod::Get, operation, params)
            .await?;
        debug!(
            "{} returned {} record(s) with status {}",
            operation,
            response.records.len(),
            response.status
        );

        if !response.is_usable() {
            debug!(
                "{} reported no free space (status {}: {})",
                operation,
                response.status,
                response.error_message().unwrap_or("no error message")
            );
            return Ok(None);
        }
        Ok(Some(response))
    }

    /// Up to four free host addresses (hex) inside the scope's subnet
    ///
    /// An inventory with no free address yields an empty list, not an error.
    pub async fn find_free_addresses(
        &self,
        scope: &AllocationScope,
    ) -> Result<Vec<String>, AllocError> {
        let operation = match scope.family {
            AddressFamily::V4 => "rpc/ip_find_free_address",
            AddressFamily::V6 => "rpc/ip6_find_free_address6",
        };

        let mut params = FormParams::new();
        params
            .add("site_id", scope.site_id.as_str())
            .add(scope.parent.param_name(scope.family), scope.parent.id())
            .add("max_find", MAX_CANDIDATES.to_string());

        debug!("Looking for free addresses in {}", scope);
        let Some(response) = self.query(operation, &params).await? else {
            return Ok(Vec::new());
        };
        let candidates = response
            .decode_records::<FreeAddress>(operation, MAX_CANDIDATES)?
            .into_iter()
            .map(|free| checked_hex(operation, &free.hex, scope.family))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Found {} free address(es) in {}", candidates.len(), scope);
        Ok(candidates)
    }

    /// Base address (hex) of one free `/prefix_length` subnet inside the scope's parent
    pub async fn find_free_subnet(
        &self,
        scope: &AllocationScope,
        prefix_length: u8,
    ) -> Result<Option<String>, AllocError> {
        // Validates the length for the family before asking the inventory.
        if prefix_length > scope.family.bits() {
            return Err(AllocError::InvalidPrefixLength(format!(
                "/{} is out of range for {}",
                prefix_length, scope.family
            )));
        }

        let operation = match scope.family {
            AddressFamily::V4 => "rpc/ip_find_free_subnet",
            AddressFamily::V6 => "rpc/ip6_find_free_subnet6",
        };

        let mut params = FormParams::new();
        params
            .add("site_id", scope.site_id.as_str())
            .add(scope.parent.param_name(scope.family), scope.parent.id())
            .add("prefix", prefix_length.to_string())
            .add("max_find", "1");

        debug!("Looking for a free /{} in {}", prefix_length, scope);
        let candidate = match self.query(operation, &params).await? {
            Some(response) => response
                .decode_records::<FreeSubnet>(operation, 1)?
                .into_iter()
                .next()
                .map(|free| checked_hex(operation, &free.start_hex, scope.family))
                .transpose()?,
            None => None,
        };
        match &candidate {
            Some(base) => debug!("Free /{} found at {} in {}", prefix_length, base, scope),
            None => debug!("No free /{} in {}", prefix_length, scope),
        }
        Ok(candidate)
    }

    /// Up to four free VLAN ids in the domain
    pub async fn find_free_vlan_ids(&self, scope: &VlanScope) -> Result<Vec<u32>, AllocError> {
        let operation = "rpc/vlm_vlan_find_free";

        let params = FormParams::new()
            .with("vlmdomain_name", scope.domain.as_str())
            .with("max_find", MAX_CANDIDATES.to_string());

        debug!("Looking for free VLAN ids in {}", scope);
        let Some(response) = self.query(operation, &params).await? else {
            return Ok(Vec::new());
        };
        let ids = response
            .decode_records::<FreeVlan>(operation, MAX_CANDIDATES)?
            .into_iter()
            .map(|free| free.vlan_id)
            .collect();
        Ok(ids)
    }
}

/// Lowercased hex candidate, once it is known to decode for `family`
///
/// A malformed value is a decode failure of the remote answer.
fn checked_hex(operation: &str, hex: &str, family: AddressFamily) -> Result<String, AllocError> {
    codec::decode(hex, family).map_err(|e| {
        AllocError::RemoteUnavailable(InventoryError::Decode {
            operation: operation.to_string(),
            reason: e.to_string(),
        })
    })?;
    Ok(hex.to_ascii_lowercase())
}
