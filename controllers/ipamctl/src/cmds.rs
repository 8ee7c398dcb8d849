//! Dispatch of parsed commands to the lifecycle flows.

use crate::args::{AddressCmd, Cli, Command, PoolCmd, SubnetCmd, VlanCmd};
use anyhow::{Context, Result, anyhow};
use inventory_client::{InventoryClient, InventoryConfig};
use ipam_allocator::{IpAddressSpec, PoolSpec, Provisioner, SubnetSpec, VlanSpec};
use std::sync::Arc;
use tracing::info;

pub async fn run(cli: Cli) -> Result<()> {
    let config = InventoryConfig::from_env().context("Failed to load inventory configuration")?;
    info!("Inventory: {}", config.base_url);

    let client =
        Arc::new(InventoryClient::new(&config).context("Failed to build inventory client")?);
    client
        .validate_credentials()
        .await
        .context("Inventory rejected the configured credentials")?;

    let provisioner = Provisioner::new(client);
    dispatch(&provisioner, cli.command).await
}

async fn dispatch(provisioner: &Provisioner, command: Command) -> Result<()> {
    match command {
        Command::Check => {
            println!("credentials accepted");
        }

        Command::Address(AddressCmd::Create { name, site, subnet, family, address, mac }) => {
            let spec = IpAddressSpec {
                name,
                site_id: site,
                subnet_id: subnet,
                family: family.into(),
                address,
                mac,
            };
            let record = provisioner.create_ip_address(&spec).await?;
            println!("{}\t{}", record.id, record.address);
        }
        Command::Address(AddressCmd::Show { id, family }) => {
            let record = provisioner
                .read_ip_address(&id, family.into())
                .await?
                .ok_or_else(|| anyhow!("IP address {} not found", id))?;
            println!("{}\t{}\t{}", record.id, record.address, record.name);
        }
        Command::Address(AddressCmd::Delete { id, family }) => {
            provisioner.delete_ip_address(&id, family.into()).await?;
            println!("{}\tdeleted", id);
        }

        Command::Subnet(SubnetCmd::Create(create)) => {
            let parent = create
                .parent()
                .ok_or_else(|| anyhow!("either --block or --parent-subnet is required"))?;
            let spec = SubnetSpec {
                parent,
                name: create.name,
                site_id: create.site,
                family: create.family.into(),
                prefix_length: create.prefix_length,
                base: create.base,
                gateway_offset: create.gateway_offset,
            };
            let record = provisioner.create_subnet(&spec).await?;
            match record.gateway {
                Some(gateway) => println!("{}\t{}\tgateway {}", record.id, record.prefix, gateway),
                None => println!("{}\t{}", record.id, record.prefix),
            }
        }
        Command::Subnet(SubnetCmd::Show { id, family }) => {
            let record = provisioner
                .read_subnet(&id, family.into())
                .await?
                .ok_or_else(|| anyhow!("Subnet {} not found", id))?;
            println!("{}\t{}\t{}", record.id, record.prefix, record.name);
        }
        Command::Subnet(SubnetCmd::Delete { id, family }) => {
            provisioner.delete_subnet(&id, family.into()).await?;
            println!("{}\tdeleted", id);
        }

        Command::Pool(PoolCmd::Create { name, site, subnet, size, start, family }) => {
            let spec = PoolSpec {
                name,
                site_id: site,
                subnet_id: subnet,
                family: family.into(),
                size,
                start,
            };
            let record = provisioner.create_pool(&spec).await?;
            println!("{}\t{}-{}", record.id, record.start, record.end);
        }
        Command::Pool(PoolCmd::Delete { id, family }) => {
            provisioner.delete_pool(&id, family.into()).await?;
            println!("{}\tdeleted", id);
        }

        Command::Vlan(VlanCmd::Create { name, domain, vlan_id }) => {
            let record = provisioner
                .create_vlan(&VlanSpec { name, domain, vlan_id })
                .await?;
            println!("{}\t{}", record.id, record.vlan_id);
        }
        Command::Vlan(VlanCmd::Delete { id }) => {
            provisioner.delete_vlan(&id).await?;
            println!("{}\tdeleted", id);
        }

        Command::DeleteDnsServer(target) => {
            provisioner
                .delete_dns_server(&target.id, target.display_name())
                .await?;
            println!("{}\tdeleted", target.id);
        }
        Command::DeleteDnsView(target) => {
            provisioner
                .delete_dns_view(&target.id, target.display_name())
                .await?;
            println!("{}\tdeleted", target.id);
        }
    }

    Ok(())
}
