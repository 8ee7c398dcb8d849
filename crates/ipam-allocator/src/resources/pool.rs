//! Address pool lifecycle

use super::Provisioner;
use crate::attempt::CreateTarget;
use crate::codec::{self, AddressFamily, BlockSize};
use crate::error::AllocError;
use crate::scope::AllocationScope;
use inventory_client::FormParams;
use std::net::IpAddr;
use tracing::info;

/// Desired address pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSpec {
    pub name: String,
    pub site_id: String,
    pub subnet_id: String,
    pub family: AddressFamily,
    /// Number of addresses; must be a power of two
    pub size: u128,
    /// Explicit first address; a free aligned range is picked when absent
    pub start: Option<String>,
}

/// Pool as stored in the inventory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolRecord {
    pub id: String,
    pub start: IpAddr,
    pub end: IpAddr,
    pub name: String,
}

struct Fields {
    add: &'static str,
    delete: &'static str,
    id: &'static str,
    subnet: &'static str,
    start: &'static str,
    end: &'static str,
    name: &'static str,
}

fn fields(family: AddressFamily) -> Fields {
    match family {
        AddressFamily::V4 => Fields {
            add: "rest/ip_pool_add",
            delete: "rest/ip_pool_delete",
            id: "pool_id",
            subnet: "subnet_id",
            start: "start_addr",
            end: "end_addr",
            name: "pool_name",
        },
        AddressFamily::V6 => Fields {
            add: "rest/ip6_pool6_add",
            delete: "rest/ip6_pool6_delete",
            id: "pool6_id",
            subnet: "subnet6_id",
            start: "start_addr6",
            end: "end_addr6",
            name: "pool6_name",
        },
    }
}

impl Provisioner {
    /// Create a pool of `size` addresses inside a subnet
    ///
    /// The size is turned into a prefix length so the inventory can look for
    /// a free aligned range of that size.
    pub async fn create_pool(&self, spec: &PoolSpec) -> Result<PoolRecord, AllocError> {
        let f = fields(spec.family);
        let size = BlockSize::from_count(spec.size)?;
        let prefix_length = codec::prefix_length_from_size(size, spec.family)?;
        let scope =
            AllocationScope::subnet(spec.site_id.as_str(), spec.subnet_id.as_str(), spec.family);

        let candidates: Vec<IpAddr> = match &spec.start {
            Some(text) => vec![codec::parse_address(text, spec.family)?],
            None => match self.finder.find_free_subnet(&scope, prefix_length).await? {
                Some(hex) => vec![codec::decode(&hex, spec.family)?],
                None => Vec::new(),
            },
        };

        let target = CreateTarget::new(f.add, spec.name.as_str(), &scope);
        let allocation = self
            .attempt
            .try_in_order(&target, candidates, |start| {
                let end = codec::range_end(*start, spec.size)?;
                let mut params = FormParams::new();
                params
                    .add("site_id", spec.site_id.as_str())
                    .add(f.subnet, spec.subnet_id.as_str())
                    .add(f.start, start.to_string())
                    .add(f.end, end.to_string())
                    .add(f.name, spec.name.as_str());
                Ok(params)
            })
            .await?;

        let end = codec::range_end(allocation.candidate, spec.size)?;
        info!("Pool {} created as {}-{}", spec.name, allocation.candidate, end);
        Ok(PoolRecord {
            id: allocation.id,
            start: allocation.candidate,
            end,
            name: spec.name.clone(),
        })
    }

    /// Delete a pool
    pub async fn delete_pool(&self, id: &str, family: AddressFamily) -> Result<(), AllocError> {
        let f = fields(family);
        let params = FormParams::new().with(f.id, id);
        self.delete_once(f.delete, &params, &format!("pool {}", id)).await
    }
}
