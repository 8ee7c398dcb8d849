//! InventoryClient trait for mocking
//!
//! The allocation core only needs one primitive: execute a named operation
//! with form parameters and get the decoded records back. Tests swap the
//! HTTP client for `MockInventoryClient`.

use crate::common::{FormParams, RequestMethod};
use crate::error::InventoryError;
use crate::models::InventoryResponse;

/// Trait for inventory API operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait InventoryClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    /// Check connectivity and credentials
    async fn validate_credentials(&self) -> Result<(), InventoryError>;

    /// Execute `operation` with `params`
    ///
    /// Transport failures and rejected credentials are errors. Any other
    /// HTTP status is returned in the response for the caller to judge.
    async fn request(
        &self,
        method: RequestMethod,
        operation: &str,
        params: &FormParams,
    ) -> Result<InventoryResponse, InventoryError>;
}
