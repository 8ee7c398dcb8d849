//! Subnet lifecycle

use super::{Provisioner, class_parameter};
use crate::attempt::CreateTarget;
use crate::codec::{self, AddressFamily, BlockSize, Prefix};
use crate::error::AllocError;
use crate::scope::{AllocationScope, ParentRef};
use inventory_client::{FormParams, SubnetInfo};
use std::net::IpAddr;
use tracing::{debug, info};

/// Desired subnet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetSpec {
    pub name: String,
    pub site_id: String,
    /// Block (or parent subnet) the subnet is carved from
    pub parent: ParentRef,
    pub family: AddressFamily,
    pub prefix_length: u8,
    /// Explicit base address; a free one is picked when absent
    pub base: Option<String>,
    /// Gateway position inside the subnet; `0` means no gateway
    pub gateway_offset: i64,
}

/// Subnet as stored in the inventory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetRecord {
    pub id: String,
    pub prefix: Prefix,
    pub name: String,
    pub gateway: Option<IpAddr>,
}

struct Fields {
    add: &'static str,
    info: &'static str,
    delete: &'static str,
    id: &'static str,
    addr: &'static str,
    prefix: &'static str,
    name: &'static str,
    class_parameters: &'static str,
}

fn fields(family: AddressFamily) -> Fields {
    match family {
        AddressFamily::V4 => Fields {
            add: "rest/ip_subnet_add",
            info: "rest/ip_block_subnet_info",
            delete: "rest/ip_subnet_delete",
            id: "subnet_id",
            addr: "subnet_addr",
            prefix: "subnet_prefix",
            name: "subnet_name",
            class_parameters: "subnet_class_parameters",
        },
        AddressFamily::V6 => Fields {
            add: "rest/ip6_block6_subnet6_add",
            info: "rest/ip6_block6_subnet6_info",
            delete: "rest/ip6_block6_subnet6_delete",
            id: "subnet6_id",
            addr: "subnet6_addr",
            prefix: "subnet6_prefix",
            name: "subnet6_name",
            class_parameters: "subnet6_class_parameters",
        },
    }
}

/// Parameter naming the container of a new subnet
fn parent_param(parent: &ParentRef, family: AddressFamily) -> &'static str {
    match (parent, family) {
        (ParentRef::Block(_), AddressFamily::V4) => "block_id",
        (ParentRef::Block(_), AddressFamily::V6) => "block6_id",
        (ParentRef::Subnet(_), AddressFamily::V4) => "parent_subnet_id",
        (ParentRef::Subnet(_), AddressFamily::V6) => "parent_subnet6_id",
    }
}

impl Provisioner {
    /// Create a subnet, picking a free range when no base is requested
    pub async fn create_subnet(&self, spec: &SubnetSpec) -> Result<SubnetRecord, AllocError> {
        let f = fields(spec.family);
        let scope = AllocationScope::new(spec.site_id.as_str(), spec.parent.clone(), spec.family);

        let bases: Vec<IpAddr> = match &spec.base {
            Some(text) => vec![codec::parse_address(text, spec.family)?],
            None => match self.finder.find_free_subnet(&scope, spec.prefix_length).await? {
                Some(hex) => vec![codec::decode(&hex, spec.family)?],
                None => Vec::new(),
            },
        };
        let candidates = bases
            .into_iter()
            .map(|base| Prefix::new(base, spec.prefix_length))
            .collect::<Result<Vec<_>, _>>()?;

        let target = CreateTarget::new(f.add, spec.name.as_str(), &scope);
        let allocation = self
            .attempt
            .try_in_order(&target, candidates, |prefix| {
                let mut params = FormParams::new();
                params
                    .add("site_id", spec.site_id.as_str())
                    .add(parent_param(&spec.parent, spec.family), spec.parent.id())
                    .add(f.addr, prefix.base().to_string())
                    .add(f.prefix, prefix.length().to_string())
                    .add(f.name, spec.name.as_str());
                if let Some(gateway) = codec::gateway_for_offset(prefix, spec.gateway_offset)? {
                    debug!("Gateway of {} set to {}", prefix, gateway);
                    params.add(f.class_parameters, format!("gateway={}", gateway));
                }
                Ok(params)
            })
            .await?;

        let gateway = codec::gateway_for_offset(&allocation.candidate, spec.gateway_offset)?;
        info!("Subnet {} created as {}", spec.name, allocation.candidate);
        Ok(SubnetRecord {
            id: allocation.id,
            prefix: allocation.candidate,
            name: spec.name.clone(),
            gateway,
        })
    }

    /// Read a subnet, normalising its base and prefix length
    ///
    /// IPv4 subnets report their size; the prefix length is derived from it.
    pub async fn read_subnet(
        &self,
        id: &str,
        family: AddressFamily,
    ) -> Result<Option<SubnetRecord>, AllocError> {
        let f = fields(family);
        let params = FormParams::new().with(f.id, id);
        let Some(info) = self.fetch_record::<SubnetInfo>(f.info, &params).await? else {
            return Ok(None);
        };

        let base = codec::decode(&info.start_hex, family)?;
        let prefix_length = match (family, info.size, info.prefix_length) {
            (AddressFamily::V4, Some(size), _) => {
                codec::prefix_length_from_size(BlockSize::from_count(size)?, family)?
            }
            (AddressFamily::V6, _, Some(length)) => length,
            _ => {
                return Err(AllocError::InvalidPrefixLength(format!(
                    "subnet {} reports neither a size nor a prefix length",
                    id
                )));
            }
        };

        let gateway = match info
            .class_parameters
            .as_deref()
            .and_then(|raw| class_parameter(raw, "gateway"))
        {
            Some(text) => Some(codec::parse_address(text, family)?),
            None => None,
        };

        Ok(Some(SubnetRecord {
            id: id.to_string(),
            prefix: Prefix::new(base, prefix_length)?,
            name: info.name.unwrap_or_default(),
            gateway,
        }))
    }

    /// Delete a subnet
    pub async fn delete_subnet(&self, id: &str, family: AddressFamily) -> Result<(), AllocError> {
        let f = fields(family);
        let params = FormParams::new().with(f.id, id);
        self.delete_once(f.delete, &params, &format!("subnet {}", id)).await
    }
}
