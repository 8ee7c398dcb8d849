//! Common request building blocks for the inventory API
//!
//! Every inventory call is a named operation (`rest/ip_add`,
//! `rpc/ip_find_free_address`, ...) plus an ordered list of form parameters
//! sent in the query string, regardless of the HTTP method.

use std::fmt;

/// HTTP method of an inventory operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
    Delete,
}

impl RequestMethod {
    /// Convert to the reqwest method
    pub fn as_reqwest(self) -> reqwest::Method {
        match self {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Ordered form parameters of an inventory operation
///
/// Insertion order is preserved on the wire. `set` replaces an existing key
/// in place, `add` always appends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormParams {
    pairs: Vec<(String, String)>,
}

impl FormParams {
    /// Create an empty parameter list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a key/value pair
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    /// Replace the first value stored under `key`, or append it
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key, value)),
        }
        self
    }

    /// Builder-style `add`
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add(key, value);
        self
    }

    /// First value stored under `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over the pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Build the URL-encoded query string
    pub fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string_preserves_order_and_encodes() {
        let params = FormParams::new()
            .with("site_id", "2")
            .with("name", "web 01")
            .with("subnet_class_parameters", "gateway=10.0.0.1");
        assert_eq!(
            params.to_query_string(),
            "site_id=2&name=web%2001&subnet_class_parameters=gateway%3D10.0.0.1"
        );
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut params = FormParams::new().with("a", "1").with("b", "2");
        params.set("a", "3");
        params.set("c", "4");
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("a", "3"), ("b", "2"), ("c", "4")]);
    }

    #[test]
    fn test_empty_params() {
        let params = FormParams::new();
        assert!(params.is_empty());
        assert_eq!(params.to_query_string(), "");
    }
}
