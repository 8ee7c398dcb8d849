//! Inventory API response models
//!
//! The appliance answers every operation with a JSON array of flat objects.
//! Values arrive as strings most of the time, but numbers and booleans show
//! up too. Records keep the raw JSON; callers decode them into the typed
//! structs below, whose fields accept either form.

use crate::error::InventoryError;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Field carrying the identifier of an object created by a `rest/*_add` call
pub const CREATED_ID_FIELD: &str = "ret_oid";

/// Field carrying a logical error message
pub const ERROR_MESSAGE_FIELD: &str = "errmsg";

/// A single response record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Build a record from key/value pairs
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into())))
                .collect(),
        }
    }

    /// Build a record from a JSON object
    pub fn from_json(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Decode the record into one of the typed records
    pub fn decode<T: DeserializeOwned>(&self, operation: &str) -> Result<T, InventoryError> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|e| {
            InventoryError::Decode {
                operation: operation.to_string(),
                reason: e.to_string(),
            }
        })
    }

    fn text(&self, field: &str) -> Option<String> {
        match self.fields.get(field)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Status fields of the first record of a response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Outcome {
    created_id: Option<String>,
    error_message: Option<String>,
}

impl Outcome {
    fn of(record: Option<&Record>) -> Self {
        let Some(record) = record else {
            return Self::default();
        };
        Self {
            created_id: record.text(CREATED_ID_FIELD).filter(|v| !v.is_empty()),
            error_message: record.text(ERROR_MESSAGE_FIELD),
        }
    }
}

/// Decoded response of an inventory operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryResponse {
    pub status: u16,
    pub records: Vec<Record>,
    outcome: Outcome,
}

impl InventoryResponse {
    pub fn new(status: u16, records: Vec<Record>) -> Self {
        let outcome = Outcome::of(records.first());
        Self {
            status,
            records,
            outcome,
        }
    }

    /// Decode a raw response body
    ///
    /// An empty body (e.g. a 204) yields no records. A single object is
    /// accepted as a one-record response.
    pub fn decode(operation: &str, status: u16, body: &str) -> Result<Self, InventoryError> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Ok(Self::new(status, Vec::new()));
        }

        let value: Value = serde_json::from_str(trimmed).map_err(|e| InventoryError::Decode {
            operation: operation.to_string(),
            reason: format!(
                "{} - Response (first 500 chars): {}",
                e,
                trimmed.chars().take(500).collect::<String>()
            ),
        })?;

        let records = match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(object) => Ok(Record::from_json(object)),
                    other => Err(InventoryError::Decode {
                        operation: operation.to_string(),
                        reason: format!("expected an object, found {}", other),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Value::Object(object) => vec![Record::from_json(object)],
            other => {
                return Err(InventoryError::Decode {
                    operation: operation.to_string(),
                    reason: format!("expected an array of objects, found {}", other),
                });
            }
        };

        Ok(Self::new(status, records))
    }

    /// HTTP status is 200 or 201
    pub fn is_success_status(&self) -> bool {
        self.status == 200 || self.status == 201
    }

    /// Answer carries data: success status and no `errmsg`
    pub fn is_usable(&self) -> bool {
        self.is_success_status() && self.error_message().is_none()
    }

    /// First record of the response
    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }

    /// Decode up to `limit` records into `T`
    pub fn decode_records<T: DeserializeOwned>(
        &self,
        operation: &str,
        limit: usize,
    ) -> Result<Vec<T>, InventoryError> {
        self.records
            .iter()
            .take(limit)
            .map(|record| record.decode(operation))
            .collect()
    }

    /// Identifier of the object created by this call
    ///
    /// Present only when the status is 200/201, there is at least one record
    /// and the first record carries `ret_oid` without an `errmsg`.
    pub fn created_id(&self) -> Option<&str> {
        if !self.is_usable() {
            return None;
        }
        self.outcome.created_id.as_deref()
    }

    /// Logical error message of the first record
    pub fn error_message(&self) -> Option<&str> {
        self.outcome.error_message.as_deref()
    }
}

/// Free host address found by `rpc/ip_find_free_address` or its IPv6 twin
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FreeAddress {
    /// Address in the appliance's hex form
    #[serde(rename = "ip_addr", alias = "ip6_addr", deserialize_with = "text::required")]
    pub hex: String,
}

/// Free subnet found by `rpc/ip_find_free_subnet` or its IPv6 twin
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FreeSubnet {
    /// Base address in the appliance's hex form
    #[serde(
        rename = "start_ip_addr",
        alias = "start_ip6_addr",
        deserialize_with = "text::required"
    )]
    pub start_hex: String,
}

/// Free VLAN id found by `rpc/vlm_vlan_find_free`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FreeVlan {
    #[serde(rename = "vlmvlan_vlan_id", deserialize_with = "text::parsed")]
    pub vlan_id: u32,
}

/// Answer of `rest/ip_address_info` or `rest/ip6_address6_info`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IpAddressInfo {
    #[serde(rename = "ip_addr", alias = "ip6_addr", deserialize_with = "text::required")]
    pub hex: String,
    #[serde(default, alias = "ip6_name", deserialize_with = "text::optional")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "text::optional")]
    pub site_id: Option<String>,
}

/// Answer of `rest/ip_block_subnet_info` or `rest/ip6_block6_subnet6_info`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubnetInfo {
    #[serde(
        rename = "start_ip_addr",
        alias = "start_ip6_addr",
        deserialize_with = "text::required"
    )]
    pub start_hex: String,
    /// Number of addresses; IPv4 only
    #[serde(default, rename = "subnet_size", deserialize_with = "text::optional_parsed")]
    pub size: Option<u128>,
    /// Prefix length; IPv6 only
    #[serde(default, rename = "subnet6_prefix", deserialize_with = "text::optional_parsed")]
    pub prefix_length: Option<u8>,
    #[serde(
        default,
        rename = "subnet_name",
        alias = "subnet6_name",
        deserialize_with = "text::optional"
    )]
    pub name: Option<String>,
    #[serde(
        default,
        rename = "subnet_class_parameters",
        alias = "subnet6_class_parameters",
        deserialize_with = "text::optional"
    )]
    pub class_parameters: Option<String>,
}

/// Field deserializers accepting a JSON string or a scalar
mod text {
    use serde::Deserialize;
    use serde::de::{Deserializer, Error};
    use serde_json::Value;
    use std::fmt::Display;
    use std::str::FromStr;

    fn scalar<E: Error>(value: Value) -> Result<Option<String>, E> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            Value::Number(n) => Ok(Some(n.to_string())),
            Value::Bool(b) => Ok(Some(b.to_string())),
            other => Err(E::custom(format!("expected a string or a number, found {}", other))),
        }
    }

    pub(super) fn optional<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        scalar(Value::deserialize(deserializer)?)
    }

    pub(super) fn required<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        optional(deserializer)?
            .filter(|s| !s.is_empty())
            .ok_or_else(|| D::Error::custom("value is empty"))
    }

    pub(super) fn parsed<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
        T::Err: Display,
    {
        let raw = required(deserializer)?;
        raw.trim()
            .parse()
            .map_err(|e| D::Error::custom(format!("'{}': {}", raw, e)))
    }

    pub(super) fn optional_parsed<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
        T::Err: Display,
    {
        match optional(deserializer)?.filter(|s| !s.is_empty()) {
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| D::Error::custom(format!("'{}': {}", raw, e))),
            None => Ok(None),
        }
    }
}
