//! IP address lifecycle

use super::Provisioner;
use crate::attempt::CreateTarget;
use crate::codec::{self, AddressFamily};
use crate::error::AllocError;
use crate::scope::AllocationScope;
use inventory_client::{FormParams, IpAddressInfo};
use std::net::IpAddr;
use tracing::info;

/// Desired IP address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpAddressSpec {
    pub name: String,
    pub site_id: String,
    pub subnet_id: String,
    pub family: AddressFamily,
    /// Explicit address; a free one is picked when absent
    pub address: Option<String>,
    pub mac: Option<String>,
}

/// IP address as stored in the inventory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpAddressRecord {
    pub id: String,
    pub address: IpAddr,
    pub name: String,
    pub site_id: Option<String>,
}

struct Fields {
    add: &'static str,
    info: &'static str,
    delete: &'static str,
    id: &'static str,
    host: &'static str,
    name: &'static str,
    mac: &'static str,
    subnet: &'static str,
}

fn fields(family: AddressFamily) -> Fields {
    match family {
        AddressFamily::V4 => Fields {
            add: "rest/ip_add",
            info: "rest/ip_address_info",
            delete: "rest/ip_delete",
            id: "ip_id",
            host: "hostaddr",
            name: "name",
            mac: "mac_addr",
            subnet: "subnet_id",
        },
        AddressFamily::V6 => Fields {
            add: "rest/ip6_address6_add",
            info: "rest/ip6_address6_info",
            delete: "rest/ip6_address6_delete",
            id: "ip6_id",
            host: "hostaddr6",
            name: "ip6_name",
            mac: "ip6_mac_addr",
            subnet: "subnet6_id",
        },
    }
}

impl Provisioner {
    /// Create an IP address, picking a free one when none is requested
    pub async fn create_ip_address(
        &self,
        spec: &IpAddressSpec,
    ) -> Result<IpAddressRecord, AllocError> {
        let f = fields(spec.family);
        let scope =
            AllocationScope::subnet(spec.site_id.as_str(), spec.subnet_id.as_str(), spec.family);

        let candidates: Vec<IpAddr> = match &spec.address {
            Some(text) => vec![codec::parse_address(text, spec.family)?],
            None => self
                .finder
                .find_free_addresses(&scope)
                .await?
                .iter()
                .map(|hex| codec::decode(hex, spec.family))
                .collect::<Result<_, _>>()?,
        };

        let target = CreateTarget::new(f.add, spec.name.as_str(), &scope);
        let allocation = self
            .attempt
            .try_in_order(&target, candidates, |address| {
                let mut params = FormParams::new();
                params
                    .add("site_id", spec.site_id.as_str())
                    .add(f.subnet, spec.subnet_id.as_str())
                    .add(f.host, address.to_string())
                    .add(f.name, spec.name.as_str());
                if let Some(mac) = &spec.mac {
                    params.add(f.mac, mac.as_str());
                }
                Ok(params)
            })
            .await?;

        info!("IP address {} assigned to {}", allocation.candidate, spec.name);
        Ok(IpAddressRecord {
            id: allocation.id,
            address: allocation.candidate,
            name: spec.name.clone(),
            site_id: Some(spec.site_id.clone()),
        })
    }

    /// Read an IP address, normalising its hex form to text
    pub async fn read_ip_address(
        &self,
        id: &str,
        family: AddressFamily,
    ) -> Result<Option<IpAddressRecord>, AllocError> {
        let f = fields(family);
        let params = FormParams::new().with(f.id, id);
        let Some(info) = self.fetch_record::<IpAddressInfo>(f.info, &params).await? else {
            return Ok(None);
        };

        Ok(Some(IpAddressRecord {
            id: id.to_string(),
            address: codec::decode(&info.hex, family)?,
            name: info.name.unwrap_or_default(),
            site_id: info.site_id,
        }))
    }

    /// Delete an IP address
    pub async fn delete_ip_address(
        &self,
        id: &str,
        family: AddressFamily,
    ) -> Result<(), AllocError> {
        let f = fields(family);
        let params = FormParams::new().with(f.id, id);
        self.delete_once(f.delete, &params, &format!("IP address {}", id)).await
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

    fn spec(address: Option<&str>) -> IpAddressSpec {
        IpAddressSpec {
            name: "web01".to_string(),
            site_id: "2".to_string(),
            subnet_id: "14".to_string(),
            family: AddressFamily::V4,
            address: address.map(str::to_string),
            mac: None,
        }
    }

    fn free(hex: &[&str]) -> Vec<Record> {
        hex.iter().map(|h| Record::from_pairs([("ip_addr", *h)])).collect()
    }

    #[tokio::test]
    async fn test_create_picks_free_address_after_lost_race() {
        let mock = MockInventoryClient::new("http://test-inventory");
        mock.push_records("rpc/ip_find_free_address", 200, free(&["0a00000a", "0a00000b"]));
        mock.push_rejected("rest/ip_add", 400, "Address already exists");
        mock.push_created("rest/ip_add", "1001");

        let record = provisioner(&mock).create_ip_address(&spec(None)).await.unwrap();
        assert_eq!(record.id, "1001");
        assert_eq!(record.address, "10.0.0.11".parse::<IpAddr>().unwrap());

        let creates = mock.calls_for("rest/ip_add");
        assert_eq!(creates.len(), 2);
        assert_eq!(creates[0].params.get("hostaddr"), Some("10.0.0.10"));
        assert_eq!(creates[1].params.get("hostaddr"), Some("10.0.0.11"));
        assert_eq!(creates[1].params.get("name"), Some("web01"));
        assert_eq!(creates[1].params.get("add_flag"), Some("new_only"));
    }

    #[tokio::test]
    async fn test_create_with_explicit_address_skips_finder() {
        let mock = MockInventoryClient::new("http://test-inventory");
        mock.push_created("rest/ip_add", "1002");

        let mut spec = spec(Some("10.0.0.50"));
        spec.mac = Some("00:11:22:33:44:55".to_string());
        let record = provisioner(&mock).create_ip_address(&spec).await.unwrap();
        assert_eq!(record.address.to_string(), "10.0.0.50");

        assert_eq!(mock.call_count("rpc/ip_find_free_address"), 0);
        let creates = mock.calls_for("rest/ip_add");
        assert_eq!(creates[0].params.get("mac_addr"), Some("00:11:22:33:44:55"));
    }

    #[tokio::test]
    async fn test_create_fails_when_subnet_is_full() {
        let mock = MockInventoryClient::new("http://test-inventory");

        let err = provisioner(&mock).create_ip_address(&spec(None)).await.unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, AllocError::AllocationExhausted { .. }));
        assert!(message.contains("web01"));
        assert!(message.contains("subnet 14"));
        assert_eq!(mock.call_count("rest/ip_add"), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_malformed_explicit_address() {
        let mock = MockInventoryClient::new("http://test-inventory");
        let err = provisioner(&mock)
            .create_ip_address(&spec(Some("10.0.0.300")))
            .await
            .unwrap_err();
        assert!(matches!(err, AllocError::MalformedAddress(_)));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_ipv6_uses_v6_fields() {
        let mock = MockInventoryClient::new("http://test-inventory");
        mock.push_records(
            "rpc/ip6_find_free_address6",
            200,
            vec![Record::from_pairs([("ip6_addr", "20010db8000000000000000000000010")])],
        );
        mock.push_created("rest/ip6_address6_add", "88");

        let mut spec = spec(None);
        spec.family = AddressFamily::V6;
        let record = provisioner(&mock).create_ip_address(&spec).await.unwrap();
        assert_eq!(record.address.to_string(), "2001:db8::10");

        let creates = mock.calls_for("rest/ip6_address6_add");
        assert_eq!(creates[0].params.get("hostaddr6"), Some("2001:db8::10"));
        assert_eq!(creates[0].params.get("ip6_name"), Some("web01"));
        assert_eq!(creates[0].params.get("subnet6_id"), Some("14"));
    }

    #[tokio::test]
    async fn test_read_normalises_hex() {
        let mock = MockInventoryClient::new("http://test-inventory");
        mock.push_records(
            "rest/ip_address_info",
            200,
            vec![Record::from_pairs([
                ("ip_addr", "c0a8010a"),
                ("name", "web01"),
                ("site_id", "2"),
            ])],
        );

        let record = provisioner(&mock)
            .read_ip_address("1001", AddressFamily::V4)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.address.to_string(), "192.168.1.10");
        assert_eq!(record.name, "web01");
        assert_eq!(record.site_id.as_deref(), Some("2"));
        assert_eq!(mock.calls()[0].params.get("ip_id"), Some("1001"));
    }

    #[tokio::test]
    async fn test_read_ipv6_and_undecodable_answer() {
        let mock = MockInventoryClient::new("http://test-inventory");
        mock.push_records(
            "rest/ip6_address6_info",
            200,
            vec![Record::from_pairs([
                ("ip6_addr", "20010db8000000000000000000000010"),
                ("ip6_name", "web01"),
            ])],
        );
        mock.push_records(
            "rest/ip6_address6_info",
            200,
            vec![Record::from_pairs([("ip6_name", "web01")])],
        );

        let p = provisioner(&mock);
        let record = p.read_ip_address("88", AddressFamily::V6).await.unwrap().unwrap();
        assert_eq!(record.address.to_string(), "2001:db8::10");
        assert_eq!(record.name, "web01");
        assert_eq!(record.site_id, None);
        assert_eq!(mock.calls()[0].params.get("ip6_id"), Some("88"));

        let err = p.read_ip_address("88", AddressFamily::V6).await.unwrap_err();
        assert!(matches!(err, AllocError::RemoteUnavailable(_)));
    }

    #[tokio::test]
    async fn test_read_missing_object() {
        let mock = MockInventoryClient::new("http://test-inventory");
        mock.push_rejected("rest/ip_address_info", 400, "Object not found");
        let record = provisioner(&mock)
            .read_ip_address("1001", AddressFamily::V4)
            .await
            .unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let mock = MockInventoryClient::new("http://test-inventory");
        mock.push_records("rest/ip_delete", 200, vec![]);
        mock.push_rejected("rest/ip_delete", 400, "locked");

        let p = provisioner(&mock);
        p.delete_ip_address("1001", AddressFamily::V4).await.unwrap();
        let err = p.delete_ip_address("1001", AddressFamily::V4).await.unwrap_err();
        assert!(err.to_string().contains("locked"));
        assert_eq!(mock.call_count("rest/ip_delete"), 2);
    }
}
