//! Command line surface of `ipamctl`.

use clap::{Args, Parser, Subcommand, ValueEnum};
use ipam_allocator::{AddressFamily, ParentRef};

#[derive(Parser, Debug)]
#[command(
    name = "ipamctl",
    version,
    about = "Allocate and release IPAM resources in the inventory"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Host addresses inside a subnet
    #[command(subcommand)]
    Address(AddressCmd),

    /// Subnets inside a block or a parent subnet
    #[command(subcommand)]
    Subnet(SubnetCmd),

    /// Address pools inside a subnet
    #[command(subcommand)]
    Pool(PoolCmd),

    /// VLANs inside a VLAN domain
    #[command(subcommand)]
    Vlan(VlanCmd),

    /// Delete a DNS server, retrying while the appliance is busy
    DeleteDnsServer(DnsDelete),

    /// Delete a DNS view, retrying while the appliance is busy
    DeleteDnsView(DnsDelete),

    /// Check that the configured credentials are accepted
    Check,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Family {
    V4,
    V6,
}

impl From<Family> for AddressFamily {
    fn from(family: Family) -> Self {
        match family {
            Family::V4 => AddressFamily::V4,
            Family::V6 => AddressFamily::V6,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum AddressCmd {
    /// Assign an address, picking a free one unless --address is given
    Create {
        name: String,
        #[arg(long)]
        site: String,
        #[arg(long)]
        subnet: String,
        #[arg(long, value_enum, default_value_t = Family::V4)]
        family: Family,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        mac: Option<String>,
    },
    /// Show an address
    Show {
        id: String,
        #[arg(long, value_enum, default_value_t = Family::V4)]
        family: Family,
    },
    /// Release an address
    Delete {
        id: String,
        #[arg(long, value_enum, default_value_t = Family::V4)]
        family: Family,
    },
}

#[derive(Args, Debug)]
pub struct SubnetCreate {
    pub name: String,
    #[arg(long)]
    pub site: String,
    /// Block to carve the subnet from
    #[arg(long, conflicts_with = "parent_subnet", required_unless_present = "parent_subnet")]
    pub block: Option<String>,
    /// Parent subnet to carve the subnet from
    #[arg(long)]
    pub parent_subnet: Option<String>,
    #[arg(long)]
    pub prefix_length: u8,
    /// Explicit base address; a free one is picked when absent
    #[arg(long)]
    pub base: Option<String>,
    /// Gateway position: positive from the base, negative from the last address, 0 for none
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub gateway_offset: i64,
    #[arg(long, value_enum, default_value_t = Family::V4)]
    pub family: Family,
}

impl SubnetCreate {
    pub fn parent(&self) -> Option<ParentRef> {
        match (&self.block, &self.parent_subnet) {
            (Some(block), _) => Some(ParentRef::Block(block.clone())),
            (None, Some(subnet)) => Some(ParentRef::Subnet(subnet.clone())),
            (None, None) => None,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum SubnetCmd {
    /// Create a subnet, picking a free range unless --base is given
    Create(SubnetCreate),
    /// Show a subnet
    Show {
        id: String,
        #[arg(long, value_enum, default_value_t = Family::V4)]
        family: Family,
    },
    /// Delete a subnet
    Delete {
        id: String,
        #[arg(long, value_enum, default_value_t = Family::V4)]
        family: Family,
    },
}

#[derive(Subcommand, Debug)]
pub enum PoolCmd {
    /// Reserve a pool of --size addresses
    Create {
        name: String,
        #[arg(long)]
        site: String,
        #[arg(long)]
        subnet: String,
        /// Number of addresses, a power of two
        #[arg(long)]
        size: u128,
        #[arg(long)]
        start: Option<String>,
        #[arg(long, value_enum, default_value_t = Family::V4)]
        family: Family,
    },
    /// Delete a pool
    Delete {
        id: String,
        #[arg(long, value_enum, default_value_t = Family::V4)]
        family: Family,
    },
}

#[derive(Subcommand, Debug)]
pub enum VlanCmd {
    /// Create a VLAN, picking a free id unless --vlan-id is given
    Create {
        name: String,
        #[arg(long)]
        domain: String,
        #[arg(long)]
        vlan_id: Option<u32>,
    },
    /// Delete a VLAN
    Delete { id: String },
}

#[derive(Args, Debug)]
pub struct DnsDelete {
    pub id: String,
    /// Name used in log and error messages
    #[arg(long)]
    pub name: Option<String>,
}

impl DnsDelete {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}
