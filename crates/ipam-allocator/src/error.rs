//! Allocation errors.
//!
//! Caller input problems, remote failures and exhausted allocations are kept
//! apart so an operator can tell "bad input" from "inventory full" from
//! "appliance unreachable".

use inventory_client::InventoryError;
use thiserror::Error;

/// Errors returned by the allocation core.
#[derive(Debug, Error)]
pub enum AllocError {
    /// Text or hex address has the wrong shape or an out-of-range group
    #[error("Malformed address: {0}")]
    MalformedAddress(String),

    /// Prefix length or block size outside the range of the address family
    #[error("Invalid prefix length: {0}")]
    InvalidPrefixLength(String),

    /// Computed gateway would fall outside its block
    #[error("Gateway out of range: {0}")]
    GatewayOutOfRange(String),

    /// Request is missing or carries an unusable field
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Inventory could not be reached or answered something undecodable
    #[error("Inventory unavailable: {0}")]
    RemoteUnavailable(#[from] InventoryError),

    /// Every candidate was refused by the inventory
    #[error("Unable to create {resource}: no free candidate could be claimed in {scope}")]
    AllocationExhausted { resource: String, scope: String },

    /// Deletion kept failing after the fixed number of attempts
    #[error("Unable to delete {0}: too many unsuccessful deletion attempts")]
    DeletionExhausted(String),
}
