//! Allocation attempt loop.
//!
//! The inventory is shared with other allocators, so a candidate reported
//! free may be gone by the time our create lands. Each candidate is tried in
//! the order the finder returned it with a `new_only` create; the first one
//! the inventory accepts wins. Candidates are never tried in parallel and
//! there is no backoff between them.

use crate::error::AllocError;
use inventory_client::{FormParams, InventoryClientTrait, RequestMethod};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Create flag making the inventory refuse an object that already exists
pub const NEW_ONLY: &str = "new_only";

/// What is being created, for requests and error messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTarget {
    /// Inventory operation issuing the create (e.g. `rest/ip_add`)
    pub operation: String,
    /// Name of the resource being created
    pub resource: String,
    /// Human readable scope the candidates came from
    pub scope: String,
}

impl CreateTarget {
    pub fn new(
        operation: impl Into<String>,
        resource: impl Into<String>,
        scope: impl fmt::Display,
    ) -> Self {
        Self {
            operation: operation.into(),
            resource: resource.into(),
            scope: scope.to_string(),
        }
    }
}

/// Candidate that was successfully claimed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation<T> {
    pub candidate: T,
    /// Identifier of the created object
    pub id: String,
}

/// Runs creates against an ordered candidate list until one succeeds
#[derive(Clone)]
pub struct AllocationAttempt {
    client: Arc<dyn InventoryClientTrait>,
}

impl fmt::Debug for AllocationAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllocationAttempt")
            .field("inventory", &self.client.base_url())
            .finish()
    }
}

impl AllocationAttempt {
    pub fn new(client: Arc<dyn InventoryClientTrait>) -> Self {
        Self { client }
    }

    /// Try `candidates` in order, stopping at the first accepted create
    ///
    /// `build_params` supplies the full field set of the resource for one
    /// candidate; the `new_only` flag is added here. A create counts as
    /// accepted when the inventory answers 200/201 with a created-object id.
    /// Anything else is treated as a race lost to another allocator and the
    /// next candidate is tried. Transport failures abort the loop.
    pub async fn try_in_order<T, F>(
        &self,
        target: &CreateTarget,
        candidates: Vec<T>,
        mut build_params: F,
    ) -> Result<Allocation<T>, AllocError>
    where
        T: fmt::Display,
        F: FnMut(&T) -> Result<FormParams, AllocError>,
    {
        let total = candidates.len();
        if total == 0 {
            warn!("No candidate available to create {} in {}", target.resource, target.scope);
        }

        for (index, candidate) in candidates.into_iter().enumerate() {
            let mut params = build_params(&candidate)?;
            params.set("add_flag", NEW_ONLY);

            debug!(
                "Creating {} at {} (candidate {}/{})",
                target.resource,
                candidate,
                index + 1,
                total
            );
            let response = self
                .client
                .request(RequestMethod::Post, &target.operation, &params)
                .await?;

            if let Some(id) = response.created_id() {
                info!("Created {} at {} (id {})", target.resource, candidate, id);
                return Ok(Allocation {
                    id: id.to_string(),
                    candidate,
                });
            }

            warn!(
                "Failed to create {} at {} (status {}: {}), trying another one",
                target.resource,
                candidate,
                response.status,
                response.error_message().unwrap_or("no object id returned")
            );
        }

        Err(AllocError::AllocationExhausted {
            resource: target.resource.clone(),
            scope: target.scope.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inventory_client::MockInventoryClient;

    const OP: &str = "rest/ip_add";

    fn attempt(mock: &MockInventoryClient) -> AllocationAttempt {
        AllocationAttempt::new(Arc::new(mock.clone()))
    }

    fn target() -> CreateTarget {
        CreateTarget::new(OP, "web01", "IPv4 subnet 14 of site 2")
    }

    fn candidates() -> Vec<String> {
        vec!["10.0.0.10".to_string(), "10.0.0.11".to_string(), "10.0.0.12".to_string()]
    }

    fn params_for(candidate: &String) -> Result<FormParams, AllocError> {
        Ok(FormParams::new()
            .with("hostaddr", candidate.as_str())
            .with("name", "web01"))
    }

    fn attempted_addresses(mock: &MockInventoryClient) -> Vec<String> {
        mock.calls_for(OP)
            .iter()
            .map(|c| c.params.get("hostaddr").unwrap_or_default().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_first_candidate_succeeds() {
        let mock = MockInventoryClient::new("http://test-inventory");
        mock.push_created(OP, "501");

        let allocation = attempt(&mock)
            .try_in_order(&target(), candidates(), params_for)
            .await
            .unwrap();

        assert_eq!(allocation.candidate, "10.0.0.10");
        assert_eq!(allocation.id, "501");
        assert_eq!(mock.call_count(OP), 1);
    }

    #[tokio::test]
    async fn test_falls_back_in_order() {
        let mock = MockInventoryClient::new("http://test-inventory");
        mock.push_rejected(OP, 400, "IP address already exists");
        mock.push_rejected(OP, 400, "IP address already exists");
        mock.push_created(OP, "777");

        let allocation = attempt(&mock)
            .try_in_order(&target(), candidates(), params_for)
            .await
            .unwrap();

        assert_eq!(allocation.candidate, "10.0.0.12");
        assert_eq!(allocation.id, "777");
        assert_eq!(attempted_addresses(&mock), candidates());
    }

    #[tokio::test]
    async fn test_success_status_without_id_is_rejection() {
        let mock = MockInventoryClient::new("http://test-inventory");
        mock.push_records(OP, 200, vec![]);
        mock.push_created(OP, "12");

        let allocation = attempt(&mock)
            .try_in_order(&target(), candidates(), params_for)
            .await
            .unwrap();
        assert_eq!(allocation.candidate, "10.0.0.11");
        assert_eq!(mock.call_count(OP), 2);
    }

    #[tokio::test]
    async fn test_exhaustion() {
        let mock = MockInventoryClient::new("http://test-inventory");
        for _ in 0..3 {
            mock.push_rejected(OP, 400, "IP address already exists");
        }

        let err = attempt(&mock)
            .try_in_order(&target(), candidates(), params_for)
            .await
            .unwrap_err();

        match err {
            AllocError::AllocationExhausted { resource, scope } => {
                assert_eq!(resource, "web01");
                assert_eq!(scope, "IPv4 subnet 14 of site 2");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(mock.call_count(OP), 3);
        assert_eq!(mock.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_candidates_fail_without_create() {
        let mock = MockInventoryClient::new("http://test-inventory");

        let err = attempt(&mock)
            .try_in_order(&target(), Vec::<String>::new(), params_for)
            .await
            .unwrap_err();

        assert!(matches!(err, AllocError::AllocationExhausted { .. }));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_aborts() {
        let mock = MockInventoryClient::new("http://test-inventory");
        mock.push_transport_failure(OP, "connection reset by peer");
        mock.push_created(OP, "9");

        let err = attempt(&mock)
            .try_in_order(&target(), candidates(), params_for)
            .await
            .unwrap_err();

        assert!(matches!(err, AllocError::RemoteUnavailable(_)));
        assert_eq!(mock.call_count(OP), 1);
    }

    #[tokio::test]
    async fn test_new_only_flag_is_always_sent() {
        let mock = MockInventoryClient::new("http://test-inventory");
        mock.push_rejected(OP, 400, "exists");
        mock.push_created(OP, "3");

        attempt(&mock)
            .try_in_order(&target(), candidates(), |c: &String| {
                Ok(FormParams::new()
                    .with("hostaddr", c.as_str())
                    .with("add_flag", "edit_only"))
            })
            .await
            .unwrap();

        for call in mock.calls_for(OP) {
            assert_eq!(call.method, RequestMethod::Post);
            assert_eq!(call.params.get("add_flag"), Some(NEW_ONLY));
        }
    }

    #[tokio::test]
    async fn test_param_builder_error_stops_loop() {
        let mock = MockInventoryClient::new("http://test-inventory");

        let err = attempt(&mock)
            .try_in_order(&target(), candidates(), |_c: &String| {
                Err(AllocError::GatewayOutOfRange("offset 300 does not fit".to_string()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AllocError::GatewayOutOfRange(_)));
        assert!(mock.calls().is_empty());
    }
}
