//! DNS server and view removal
//!
//! The appliance refuses to drop a DNS server or view while it is still
//! being synchronised, so these deletions go through the retry policy.

use super::Provisioner;
use crate::error::AllocError;
use inventory_client::FormParams;

impl Provisioner {
    /// Delete a DNS server, retrying while the appliance is busy
    pub async fn delete_dns_server(&self, id: &str, name: &str) -> Result<(), AllocError> {
        let params = FormParams::new().with("dns_id", id);
        self.deletion
            .delete("rest/dns_server_delete", &params, &format!("DNS server {}", name))
            .await
    }

    /// Delete a DNS view, retrying while the appliance is busy
    pub async fn delete_dns_view(&self, id: &str, name: &str) -> Result<(), AllocError> {
        let params = FormParams::new().with("dnsview_id", id);
        self.deletion
            .delete("rest/dns_view_delete", &params, &format!("DNS view {}", name))
            .await
    }
}
