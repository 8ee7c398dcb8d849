//! Fixed-count deletion retry.
//!
//! Some objects (DNS servers, DNS views) cannot be deleted while the
//! appliance is still busy with them. Deletion is retried a fixed number of
//! times with a fixed pause in between; there is no pause after the last
//! failed attempt.

use crate::error::AllocError;
use inventory_client::{FormParams, InventoryClientTrait, RequestMethod};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default number of deletion attempts
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Default pause between deletion attempts
pub const DEFAULT_DELAY: Duration = Duration::from_secs(8);

/// Retries a delete operation a fixed number of times
#[derive(Clone)]
pub struct DeletionRetry {
    client: Arc<dyn InventoryClientTrait>,
    attempts: u32,
    delay: Duration,
}

impl std::fmt::Debug for DeletionRetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeletionRetry")
            .field("inventory", &self.client.base_url())
            .field("attempts", &self.attempts)
            .field("delay", &self.delay)
            .finish()
    }
}

impl DeletionRetry {
    /// Three attempts, eight seconds apart
    pub fn new(client: Arc<dyn InventoryClientTrait>) -> Self {
        Self::with_policy(client, DEFAULT_ATTEMPTS, DEFAULT_DELAY)
    }

    pub fn with_policy(
        client: Arc<dyn InventoryClientTrait>,
        attempts: u32,
        delay: Duration,
    ) -> Self {
        Self {
            client,
            attempts: attempts.max(1),
            delay,
        }
    }

    /// Delete `resource` through `operation`
    ///
    /// An attempt succeeds on HTTP 200 or 204. Transport failures are
    /// returned immediately; they are not retried here.
    pub async fn delete(
        &self,
        operation: &str,
        params: &FormParams,
        resource: &str,
    ) -> Result<(), AllocError> {
        for attempt in 1..=self.attempts {
            debug!("Deleting {} (attempt {}/{})", resource, attempt, self.attempts);
            let response = self
                .client
                .request(RequestMethod::Delete, operation, params)
                .await?;

            if response.status == 200 || response.status == 204 {
                info!("Deleted {}", resource);
                return Ok(());
            }

            warn!(
                "Unable to delete {} (status {}: {})",
                resource,
                response.status,
                response.error_message().unwrap_or("no error message")
            );

            if attempt < self.attempts {
                tokio::time::sleep(self.delay).await;
            }
        }

        Err(AllocError::DeletionExhausted(resource.to_string()))
    }
}
