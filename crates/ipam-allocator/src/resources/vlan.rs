//! VLAN lifecycle

use super::Provisioner;
use crate::attempt::CreateTarget;
use crate::error::AllocError;
use crate::scope::VlanScope;
use inventory_client::FormParams;
use tracing::info;

/// Desired VLAN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlanSpec {
    pub name: String,
    pub domain: String,
    /// Explicit VLAN id; a free one is picked when absent
    pub vlan_id: Option<u32>,
}

/// VLAN as stored in the inventory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlanRecord {
    pub id: String,
    pub vlan_id: u32,
    pub name: String,
    pub domain: String,
}

impl Provisioner {
    /// Create a VLAN, picking a free id when none is requested
    pub async fn create_vlan(&self, spec: &VlanSpec) -> Result<VlanRecord, AllocError> {
        let scope = VlanScope::new(spec.domain.as_str());

        let candidates = match spec.vlan_id {
            Some(0) => {
                return Err(AllocError::InvalidRequest("VLAN id 0 is reserved".to_string()));
            }
            Some(vlan_id) => vec![vlan_id],
            None => self.finder.find_free_vlan_ids(&scope).await?,
        };

        let target = CreateTarget::new("rest/vlm_vlan_add", spec.name.as_str(), &scope);
        let allocation = self
            .attempt
            .try_in_order(&target, candidates, |vlan_id| {
                Ok(FormParams::new()
                    .with("vlmdomain_name", spec.domain.as_str())
                    .with("vlmvlan_vlan_id", vlan_id.to_string())
                    .with("vlmvlan_name", spec.name.as_str()))
            })
            .await?;

        info!("VLAN {} created with id {} in {}", spec.name, allocation.candidate, scope);
        Ok(VlanRecord {
            id: allocation.id,
            vlan_id: allocation.candidate,
            name: spec.name.clone(),
            domain: spec.domain.clone(),
        })
    }

    /// Delete a VLAN
    pub async fn delete_vlan(&self, id: &str) -> Result<(), AllocError> {
        let params = FormParams::new().with("vlmvlan_id", id);
        self.delete_once("rest/vlm_vlan_delete", &params, &format!("VLAN {}", id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inventory_client::{MockInventoryClient, Record};
    use std::sync::Arc;

    fn provisioner(mock: &MockInventoryClient) -> Provisioner {
        Provisioner::new(Arc::new(mock.clone()))
    }

    fn spec(vlan_id: Option<u32>) -> VlanSpec {
        VlanSpec {
            name: "storage".to_string(),
            domain: "campus".to_string(),
            vlan_id,
        }
    }

    #[tokio::test]
    async fn test_create_tries_free_ids_in_order() {
        let mock = MockInventoryClient::new("http://test-inventory");
        mock.push_records(
            "rpc/vlm_vlan_find_free",
            200,
            vec![
                Record::from_pairs([("vlmvlan_vlan_id", "120")]),
                Record::from_pairs([("vlmvlan_vlan_id", "121")]),
                Record::from_pairs([("vlmvlan_vlan_id", "122")]),
            ],
        );
        mock.push_rejected("rest/vlm_vlan_add", 400, "VLAN already exists");
        mock.push_created("rest/vlm_vlan_add", "9001");

        let record = provisioner(&mock).create_vlan(&spec(None)).await.unwrap();
        assert_eq!(record.vlan_id, 121);
        assert_eq!(record.id, "9001");

        let ids: Vec<_> = mock
            .calls_for("rest/vlm_vlan_add")
            .iter()
            .map(|c| c.params.get("vlmvlan_vlan_id").unwrap_or_default().to_string())
            .collect();
        assert_eq!(ids, vec!["120", "121"]);
    }

    #[tokio::test]
    async fn test_create_explicit_id() {
        let mock = MockInventoryClient::new("http://test-inventory");
        mock.push_created("rest/vlm_vlan_add", "9002");

        let record = provisioner(&mock).create_vlan(&spec(Some(42))).await.unwrap();
        assert_eq!(record.vlan_id, 42);
        assert_eq!(mock.call_count("rpc/vlm_vlan_find_free"), 0);
    }

    #[tokio::test]
    async fn test_create_reserved_id() {
        let mock = MockInventoryClient::new("http://test-inventory");
        let err = provisioner(&mock).create_vlan(&spec(Some(0))).await.unwrap_err();
        assert!(matches!(err, AllocError::InvalidRequest(_)));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_exhausted_names_domain() {
        let mock = MockInventoryClient::new("http://test-inventory");
        let err = provisioner(&mock).create_vlan(&spec(None)).await.unwrap_err();
        assert!(err.to_string().contains("storage"));
        assert!(err.to_string().contains("VLAN domain campus"));
    }

    #[tokio::test]
    async fn test_delete() {
        let mock = MockInventoryClient::new("http://test-inventory");
        mock.push_records("rest/vlm_vlan_delete", 200, vec![]);
        provisioner(&mock).delete_vlan("9001").await.unwrap();
        assert_eq!(mock.calls()[0].params.get("vlmvlan_id"), Some("9001"));
    }
}
