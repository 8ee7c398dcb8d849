//! Inventory client configuration
//!
//! Host, credentials and TLS trust are carried in an explicit value that is
//! handed to [`InventoryClient::new`](crate::InventoryClient::new).

use crate::error::InventoryError;
use std::env;
use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the inventory API
#[derive(Clone)]
pub struct InventoryConfig {
    /// Base URL of the appliance (e.g. "https://ipam.example.net")
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Verify the appliance certificate
    pub ssl_verify: bool,
    /// Per-request timeout
    pub timeout: Duration,
    /// Extra PEM-encoded CA certificates to trust
    pub additional_trust_certs: Option<String>,
}

impl std::fmt::Debug for InventoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("ssl_verify", &self.ssl_verify)
            .field("timeout", &self.timeout)
            .field("additional_trust_certs", &self.additional_trust_certs.is_some())
            .finish()
    }
}

impl InventoryConfig {
    /// Create a configuration with default TLS and timeout settings
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            ssl_verify: true,
            timeout: DEFAULT_TIMEOUT,
            additional_trust_certs: None,
        }
    }

    /// Load the configuration from environment variables
    ///
    /// * `INVENTORY_URL` (required)
    /// * `INVENTORY_USERNAME` (required)
    /// * `INVENTORY_PASSWORD` (required)
    /// * `INVENTORY_SSL_VERIFY` (optional, default `true`)
    /// * `INVENTORY_TIMEOUT_SECS` (optional, default 30)
    /// * `INVENTORY_TRUST_CERTS_FILE` (optional, PEM bundle path)
    pub fn from_env() -> Result<Self, InventoryError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, InventoryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).filter(|v| !v.is_empty()).ok_or_else(|| {
                InventoryError::InvalidConfig(format!("{} environment variable is required", key))
            })
        };

        let mut config = Self::new(
            required("INVENTORY_URL")?,
            required("INVENTORY_USERNAME")?,
            required("INVENTORY_PASSWORD")?,
        );

        if let Some(raw) = lookup("INVENTORY_SSL_VERIFY") {
            config.ssl_verify = parse_bool(&raw).ok_or_else(|| {
                InventoryError::InvalidConfig(format!(
                    "INVENTORY_SSL_VERIFY is not a boolean: {}",
                    raw
                ))
            })?;
        }

        if let Some(raw) = lookup("INVENTORY_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|e| {
                InventoryError::InvalidConfig(format!(
                    "INVENTORY_TIMEOUT_SECS is invalid ({}): {}",
                    raw, e
                ))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(path) = lookup("INVENTORY_TRUST_CERTS_FILE") {
            let pem = std::fs::read_to_string(&path).map_err(|e| {
                InventoryError::InvalidConfig(format!(
                    "Unable to read trust certificates {}: {}",
                    path, e
                ))
            })?;
            config.additional_trust_certs = Some(pem);
        }

        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(InventoryError::InvalidConfig(format!(
                "INVENTORY_URL must start with http:// or https://: {}",
                config.base_url
            )));
        }

        Ok(config)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
