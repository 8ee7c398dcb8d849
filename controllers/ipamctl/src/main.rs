//! IPAM operator CLI
//!
//! Allocates and releases addresses, subnets, pools and VLANs in the
//! inventory, and removes DNS servers and views. The inventory endpoint and
//! credentials come from `INVENTORY_*` environment variables.

mod args;
mod cmds;

use args::Cli;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    cmds::run(cli).await
}
