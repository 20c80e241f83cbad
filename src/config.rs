//! # Dispatch Configuration Module
//!
//! Configuration for the [`Dispatcher`](crate::dispatcher::Dispatcher), loadable from
//! environment variables or a YAML file.
//!
//! ## Environment Variables
//!
//! ### `ENDPOINTS_CONTENT_TYPE`
//!
//! Media type the service responds with. Used to filter the `Accept` header when looking
//! for a version token. Default: `*/*` (any entry may carry the version).
//!
//! ### `ENDPOINTS_DEFAULT_CLASS`
//!
//! Class name used when the next path segment does not name a class. Default: `Default`.
//!
//! ### `ENDPOINTS_EXPOSE_ERRORS`
//!
//! When `true`, the message of an unhandled error is returned in the 500 body instead of a
//! generic one. Development only. Default: `false`.
//!
//! ### `ENDPOINTS_REQUEST_ID_HEADER`
//!
//! Header carrying an upstream correlation id. Default: `x-request-id`.
//!
//! ## YAML
//!
//! ```yaml
//! content_type: application/json
//! default_class: Index
//! expose_errors: false
//! ```
//!
//! Missing keys fall back to their defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

pub const DEFAULT_CONTENT_TYPE: &str = "*/*";
pub const DEFAULT_CLASS_NAME: &str = "Default";
pub const DEFAULT_REQUEST_ID_HEADER: &str = "x-request-id";

/// Dispatcher settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Response media type used for version negotiation (default: `*/*`)
    pub content_type: String,
    /// Fallback class name inside a namespace (default: `Default`)
    pub default_class: String,
    /// Return unhandled error messages in 500 bodies (default: false)
    pub expose_errors: bool,
    /// Header an upstream correlation id is read from (default: `x-request-id`)
    pub request_id_header: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            default_class: DEFAULT_CLASS_NAME.to_string(),
            expose_errors: false,
            request_id_header: DEFAULT_REQUEST_ID_HEADER.to_string(),
        }
    }
}

impl DispatchConfig {
    /// Load configuration from environment variables over the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Overlay values from `lookup` (an environment-like key lookup) onto `self`.
    ///
    /// Unparsable booleans and empty strings leave the current value untouched.
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("ENDPOINTS_CONTENT_TYPE") {
            self.content_type = v.trim().to_string();
        }
        if let Some(v) = non_empty("ENDPOINTS_DEFAULT_CLASS") {
            self.default_class = v.trim().to_string();
        }
        if let Some(v) = non_empty("ENDPOINTS_EXPOSE_ERRORS").and_then(|v| parse_bool(&v)) {
            self.expose_errors = v;
        }
        if let Some(v) = non_empty("ENDPOINTS_REQUEST_ID_HEADER") {
            self.request_id_header = v.trim().to_ascii_lowercase();
        }
        self
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("invalid dispatch configuration")
    }

    /// Read a YAML file, then apply environment overrides on top.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::from_yaml_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config.with_overrides(|key| env::var(key).ok()))
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = DispatchConfig::default();
        assert_eq!(config.content_type, "*/*");
        assert_eq!(config.default_class, "Default");
        assert!(!config.expose_errors);
        assert_eq!(config.request_id_header, "x-request-id");
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ENDPOINTS_CONTENT_TYPE", "application/json"),
            ("ENDPOINTS_DEFAULT_CLASS", "Index"),
            ("ENDPOINTS_EXPOSE_ERRORS", "yes"),
            ("ENDPOINTS_REQUEST_ID_HEADER", "X-Correlation-Id"),
        ]
        .into_iter()
        .collect();
        let config = DispatchConfig::default()
            .with_overrides(|k| vars.get(k).map(|v| (*v).to_string()));
        assert_eq!(config.content_type, "application/json");
        assert_eq!(config.default_class, "Index");
        assert!(config.expose_errors);
        assert_eq!(config.request_id_header, "x-correlation-id");
    }

    #[test]
    fn test_bad_bool_keeps_value() {
        let config = DispatchConfig::default().with_overrides(|k| {
            (k == "ENDPOINTS_EXPOSE_ERRORS").then(|| "maybe".to_string())
        });
        assert!(!config.expose_errors);
    }

    #[test]
    fn test_partial_yaml() {
        let config = DispatchConfig::from_yaml_str("content_type: application/json\n").unwrap();
        assert_eq!(config.content_type, "application/json");
        assert_eq!(config.default_class, "Default");
    }

    #[test]
    fn test_yaml_rejects_wrong_types() {
        assert!(DispatchConfig::from_yaml_str("expose_errors: [1, 2]\n").is_err());
    }
}
