//! Mock InventoryClient for unit testing
//!
//! This module provides a scripted implementation of InventoryClientTrait that
//! can be used in unit tests without a reachable appliance. Responses are
//! queued per operation name and every call is recorded so tests can assert
//! on the exact sequence of requests.

use crate::common::{FormParams, RequestMethod};
use crate::error::InventoryError;
use crate::inventory_trait::InventoryClientTrait;
use crate::models::{InventoryResponse, Record};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// A request observed by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub method: RequestMethod,
    pub operation: String,
    pub params: FormParams,
}

/// Scripted outcome of a single call
#[derive(Debug, Clone)]
enum Scripted {
    Response(InventoryResponse),
    TransportFailure(String),
}

/// Mock InventoryClient for testing
///
/// Unscripted calls answer `200` with no records.
#[derive(Debug, Clone)]
pub struct MockInventoryClient {
    base_url: String,
    queued: Arc<Mutex<HashMap<String, VecDeque<Scripted>>>>,
    defaults: Arc<Mutex<HashMap<String, Scripted>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    credentials_valid: Arc<Mutex<bool>>,
}

impl MockInventoryClient {
    /// Create a new mock client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            queued: Arc::new(Mutex::new(HashMap::new())),
            defaults: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            credentials_valid: Arc::new(Mutex::new(true)),
        }
    }

    fn enqueue(&self, operation: &str, scripted: Scripted) {
        self.queued
            .lock()
            .unwrap()
            .entry(operation.to_string())
            .or_default()
            .push_back(scripted);
    }

    /// Queue a response for the next call of `operation`
    pub fn push_response(&self, operation: &str, response: InventoryResponse) {
        self.enqueue(operation, Scripted::Response(response));
    }

    /// Queue a response built from a status and records
    pub fn push_records(&self, operation: &str, status: u16, records: Vec<Record>) {
        self.push_response(operation, InventoryResponse::new(status, records));
    }

    /// Queue a successful create answering `ret_oid = id`
    pub fn push_created(&self, operation: &str, id: &str) {
        self.push_records(operation, 201, vec![Record::from_pairs([("ret_oid", id)])]);
    }

    /// Queue a logical rejection carrying `errmsg`
    pub fn push_rejected(&self, operation: &str, status: u16, errmsg: &str) {
        self.push_records(operation, status, vec![Record::from_pairs([("errmsg", errmsg)])]);
    }

    /// Queue a transport failure for the next call of `operation`
    pub fn push_transport_failure(&self, operation: &str, message: &str) {
        self.enqueue(operation, Scripted::TransportFailure(message.to_string()));
    }

    /// Response returned once the queue of `operation` is drained
    pub fn set_default_response(&self, operation: &str, response: InventoryResponse) {
        self.defaults
            .lock()
            .unwrap()
            .insert(operation.to_string(), Scripted::Response(response));
    }

    /// Make `validate_credentials` fail
    pub fn reject_credentials(&self) {
        *self.credentials_valid.lock().unwrap() = false;
    }

    /// All calls observed so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls observed for `operation`, in order
    pub fn calls_for(&self, operation: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == operation)
            .cloned()
            .collect()
    }

    /// Number of calls observed for `operation`
    pub fn call_count(&self, operation: &str) -> usize {
        self.calls_for(operation).len()
    }

    fn next_scripted(&self, operation: &str) -> Option<Scripted> {
        let queued = self
            .queued
            .lock()
            .unwrap()
            .get_mut(operation)
            .and_then(VecDeque::pop_front);
        queued.or_else(|| self.defaults.lock().unwrap().get(operation).cloned())
    }
}

#[async_trait::async_trait]
impl InventoryClientTrait for MockInventoryClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn validate_credentials(&self) -> Result<(), InventoryError> {
        if *self.credentials_valid.lock().unwrap() {
            Ok(())
        } else {
            Err(InventoryError::Authentication(
                "GET rest/member_list rejected: 401 Unauthorized".to_string(),
            ))
        }
    }

    async fn request(
        &self,
        method: RequestMethod,
        operation: &str,
        params: &FormParams,
    ) -> Result<InventoryResponse, InventoryError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            operation: operation.to_string(),
            params: params.clone(),
        });

        match self.next_scripted(operation) {
            Some(Scripted::Response(response)) => Ok(response),
            Some(Scripted::TransportFailure(message)) => Err(InventoryError::Api(format!(
                "{} {} failed: {}",
                method, operation, message
            ))),
            None => Ok(InventoryResponse::new(200, Vec::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_then_default() {
        let mock = MockInventoryClient::new("http://test-inventory");
        mock.push_created("rest/ip_add", "11");
        mock.set_default_response(
            "rest/ip_add",
            InventoryResponse::new(400, vec![Record::from_pairs([("errmsg", "exists")])]),
        );

        let params = FormParams::new().with("hostaddr", "10.0.0.5");
        let first = mock.request(RequestMethod::Post, "rest/ip_add", &params).await.unwrap();
        assert_eq!(first.created_id(), Some("11"));

        let second = mock.request(RequestMethod::Post, "rest/ip_add", &params).await.unwrap();
        assert_eq!(second.status, 400);
        assert_eq!(second.error_message(), Some("exists"));

        assert_eq!(mock.call_count("rest/ip_add"), 2);
        assert_eq!(mock.calls()[0].params.get("hostaddr"), Some("10.0.0.5"));
    }

    #[tokio::test]
    async fn test_unscripted_and_failures() {
        let mock = MockInventoryClient::new("http://test-inventory");
        let empty = mock
            .request(RequestMethod::Get, "rpc/ip_find_free_address", &FormParams::new())
            .await
            .unwrap();
        assert_eq!(empty.status, 200);
        assert!(empty.records.is_empty());

        mock.push_transport_failure("rest/ip_delete", "connection reset");
        assert!(mock
            .request(RequestMethod::Delete, "rest/ip_delete", &FormParams::new())
            .await
            .is_err());

        assert!(mock.validate_credentials().await.is_ok());
        mock.reject_credentials();
        assert!(matches!(
            mock.validate_credentials().await,
            Err(InventoryError::Authentication(_))
        ));
    }
}
