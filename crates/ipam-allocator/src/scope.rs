//! Allocation scopes.
//!
//! A scope bounds a free-space query: which site, which parent container and
//! which address family. Scopes are built per call and never stored.

use crate::codec::AddressFamily;
use std::fmt;

/// Container a free-space query searches in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentRef {
    /// Top-level address block
    Block(String),
    /// Subnet (terminal or not)
    Subnet(String),
}

impl ParentRef {
    pub fn id(&self) -> &str {
        match self {
            ParentRef::Block(id) | ParentRef::Subnet(id) => id,
        }
    }

    /// Form parameter naming this parent in the given family
    pub(crate) fn param_name(&self, family: AddressFamily) -> &'static str {
        match (self, family) {
            (ParentRef::Block(_), AddressFamily::V4) => "block_id",
            (ParentRef::Block(_), AddressFamily::V6) => "block6_id",
            (ParentRef::Subnet(_), AddressFamily::V4) => "subnet_id",
            (ParentRef::Subnet(_), AddressFamily::V6) => "subnet6_id",
        }
    }
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentRef::Block(id) => write!(f, "block {}", id),
            ParentRef::Subnet(id) => write!(f, "subnet {}", id),
        }
    }
}

/// Site, parent container and family of an address or subnet allocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationScope {
    pub site_id: String,
    pub parent: ParentRef,
    pub family: AddressFamily,
}

impl AllocationScope {
    pub fn new(site_id: impl Into<String>, parent: ParentRef, family: AddressFamily) -> Self {
        Self {
            site_id: site_id.into(),
            parent,
            family,
        }
    }

    /// Scope for addresses inside a subnet
    pub fn subnet(
        site_id: impl Into<String>,
        subnet_id: impl Into<String>,
        family: AddressFamily,
    ) -> Self {
        Self::new(site_id, ParentRef::Subnet(subnet_id.into()), family)
    }

    /// Scope for subnets inside a block
    pub fn block(
        site_id: impl Into<String>,
        block_id: impl Into<String>,
        family: AddressFamily,
    ) -> Self {
        Self::new(site_id, ParentRef::Block(block_id.into()), family)
    }
}

impl fmt::Display for AllocationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} of site {}", self.family, self.parent, self.site_id)
    }
}

/// VLAN domain a VLAN id is allocated from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlanScope {
    pub domain: String,
}

impl VlanScope {
    pub fn new(domain: impl Into<String>) -> Self {
        Self { domain: domain.into() }
    }
}

impl fmt::Display for VlanScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VLAN domain {}", self.domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_display_names_site_and_parent() {
        let scope = AllocationScope::subnet("3", "41", AddressFamily::V4);
        assert_eq!(scope.to_string(), "IPv4 subnet 41 of site 3");

        let scope = AllocationScope::block("3", "7", AddressFamily::V6);
        assert_eq!(scope.to_string(), "IPv6 block 7 of site 3");
        assert_eq!(VlanScope::new("campus").to_string(), "VLAN domain campus");
    }

    #[test]
    fn test_parent_param_names() {
        let block = ParentRef::Block("1".to_string());
        let subnet = ParentRef::Subnet("2".to_string());
        assert_eq!(block.param_name(AddressFamily::V4), "block_id");
        assert_eq!(block.param_name(AddressFamily::V6), "block6_id");
        assert_eq!(subnet.param_name(AddressFamily::V4), "subnet_id");
        assert_eq!(subnet.param_name(AddressFamily::V6), "subnet6_id");
        assert_eq!(subnet.id(), "2");
    }
}
