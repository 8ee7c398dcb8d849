//! Inventory API client
//!
//! Implements the HTTP transport for the appliance REST API. Operations live
//! under `/rest/` (CRUD) and `/rpc/` (computations such as free-space
//! lookups); parameters always travel in the query string.

use crate::common::{FormParams, RequestMethod};
use crate::config::InventoryConfig;
use crate::error::InventoryError;
use crate::models::InventoryResponse;
use crate::inventory_trait::InventoryClientTrait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use tracing::debug;

/// Inventory API client
pub struct InventoryClient {
    client: Client,
    base_url: String,
    username_header: String,
    password_header: String,
}

impl std::fmt::Debug for InventoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl InventoryClient {
    /// Create a new inventory client
    ///
    /// # Arguments
    /// * `config` - Host, credentials and TLS settings
    pub fn new(config: &InventoryConfig) -> Result<Self, InventoryError> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.ssl_verify);

        if let Some(pem) = &config.additional_trust_certs {
            let certs = reqwest::Certificate::from_pem_bundle(pem.as_bytes()).map_err(|e| {
                InventoryError::InvalidConfig(format!("Invalid trust certificate bundle: {}", e))
            })?;
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username_header: STANDARD.encode(&config.username),
            password_header: STANDARD.encode(&config.password),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the full URL of an operation
    pub fn build_url(&self, operation: &str, params: &FormParams) -> String {
        let url = format!("{}/{}", self.base_url, operation.trim_start_matches('/'));
        if params.is_empty() {
            url
        } else {
            format!("{}?{}", url, params.to_query_string())
        }
    }

    /// Execute an operation and decode its records
    pub async fn request(
        &self,
        method: RequestMethod,
        operation: &str,
        params: &FormParams,
    ) -> Result<InventoryResponse, InventoryError> {
        let url = self.build_url(operation, params);
        debug!("{} {}", method, url);

        let response = self
            .client
            .request(method.as_reqwest(), &url)
            .header("X-IPM-Username", &self.username_header)
            .header("X-IPM-Password", &self.password_header)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(InventoryError::Http)?;

        let status = response.status();
        let body = response.text().await?;

        if status == 401 || status == 403 {
            return Err(InventoryError::Authentication(format!(
                "{} {} rejected: {} - {}",
                method, operation, status, body
            )));
        }

        debug!("{} {} returned {}", method, operation, status);
        InventoryResponse::decode(operation, status.as_u16(), &body)
    }

    /// Validate the credentials by making a lightweight authenticated request.
    ///
    /// # Returns
    /// * `Ok(())` - Credentials are valid and the appliance is reachable
    /// * `Err(InventoryError)` - Credentials are invalid or the appliance is unreachable
    pub async fn validate_credentials(&self) -> Result<(), InventoryError> {
        debug!("Validating inventory credentials and connectivity");

        let params = FormParams::new().with("limit", "1");
        let response = self
            .request(RequestMethod::Get, "rest/member_list", &params)
            .await?;

        if !response.is_success_status() && response.status != 204 {
            return Err(InventoryError::Api(format!(
                "Failed to validate credentials: {} - {}",
                response.status,
                response.error_message().unwrap_or("no error message")
            )));
        }

        debug!("Credentials validated successfully");
        Ok(())
    }
}

#[async_trait::async_trait]
impl InventoryClientTrait for InventoryClient {
    fn base_url(&self) -> &str {
        InventoryClient::base_url(self)
    }

    async fn validate_credentials(&self) -> Result<(), InventoryError> {
        InventoryClient::validate_credentials(self).await
    }

    async fn request(
        &self,
        method: RequestMethod,
        operation: &str,
        params: &FormParams,
    ) -> Result<InventoryResponse, InventoryError> {
        InventoryClient::request(self, method, operation, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url() {
        let config = InventoryConfig::new("https://ipam.example.net/", "admin", "secret");
        let client = InventoryClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "https://ipam.example.net");

        let params = FormParams::new().with("subnet_id", "12").with("max_find", "4");
        assert_eq!(
            client.build_url("rpc/ip_find_free_address", &params),
            "https://ipam.example.net/rpc/ip_find_free_address?subnet_id=12&max_find=4"
        );
        assert_eq!(
            client.build_url("/rest/member_list", &FormParams::new()),
            "https://ipam.example.net/rest/member_list"
        );
    }

    #[tokio::test]
    async fn test_truncated_body_is_a_transport_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            // Announce more bytes than are sent, then hang up
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 500\r\n\r\n0123456789")
                .await;
            let _ = socket.shutdown().await;
        });

        let config = InventoryConfig::new(format!("http://{}", addr), "admin", "secret");
        let client = InventoryClient::new(&config).unwrap();
        let err = client
            .request(RequestMethod::Get, "rpc/ip_find_free_address", &FormParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::Http(_)), "unexpected error: {err:?}");
    }
}
