use crate::classification::{DataClassification, PathLoggingMode, RedactionMode};
use crate::error::EgressError;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

/// Outbound call logging settings for one client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Emit an informational record as soon as the request is observed.
    #[serde(default)]
    pub log_request_start: bool,
    /// Request headers to capture, in the order they are logged.
    /// An empty list disables request-header logging.
    #[serde(default)]
    pub request_headers: Vec<HeaderClassification>,
    /// Response headers to capture. Empty disables response-header logging.
    #[serde(default)]
    pub response_headers: Vec<HeaderClassification>,
    #[serde(default)]
    pub log_body: bool,
    #[serde(default = "default_body_size_limit")]
    pub body_size_limit: usize,
    #[serde(default = "default_body_read_timeout")]
    pub body_read_timeout_ms: u64,
    #[serde(default)]
    pub request_body_content_types: Vec<String>,
    #[serde(default)]
    pub response_body_content_types: Vec<String>,
    #[serde(default)]
    pub path_redaction_mode: RedactionMode,
    #[serde(default)]
    pub path_logging_mode: PathLoggingMode,
    /// Classification of route parameters, keyed by parameter name.
    #[serde(default)]
    pub route_parameters: HashMap<String, DataClassification>,
    /// Max idle objects kept per pool.
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,
    /// Enrichers, invoked in this order.
    #[serde(default)]
    pub enrichers: Vec<EnricherConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeaderClassification {
    pub name: String,
    pub classification: DataClassification,
}

impl HeaderClassification {
    pub fn new(name: impl Into<String>, classification: DataClassification) -> Self {
        Self {
            name: name.into(),
            classification,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnricherConfig {
    pub name: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

// ── Limits ────────────────────────────────────────────────────

pub const MIN_BODY_SIZE_LIMIT: usize = 1;
pub const MAX_BODY_SIZE_LIMIT: usize = 1_572_864;
pub const MIN_BODY_READ_TIMEOUT_MS: u64 = 1;
pub const MAX_BODY_READ_TIMEOUT_MS: u64 = 60_000;
pub const MAX_POOL_CAPACITY: usize = 65_536;

// ── Defaults ──────────────────────────────────────────────────

fn default_body_size_limit() -> usize { 32 * 1024 }
fn default_body_read_timeout() -> u64 { 1000 }
fn default_pool_capacity() -> usize { 1024 }

// ── Impls ─────────────────────────────────────────────────────

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_request_start: false,
            request_headers: Vec::new(),
            response_headers: Vec::new(),
            log_body: false,
            body_size_limit: default_body_size_limit(),
            body_read_timeout_ms: default_body_read_timeout(),
            request_body_content_types: Vec::new(),
            response_body_content_types: Vec::new(),
            path_redaction_mode: RedactionMode::default(),
            path_logging_mode: PathLoggingMode::default(),
            route_parameters: HashMap::new(),
            pool_capacity: default_pool_capacity(),
            enrichers: Vec::new(),
        }
    }
}

impl LoggingConfig {
    /// Load configuration from a YAML file + `EGRESS_` env overrides.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config: LoggingConfig = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("EGRESS_").split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn log_request_headers(&self) -> bool {
        !self.request_headers.is_empty()
    }

    pub fn log_response_headers(&self) -> bool {
        !self.response_headers.is_empty()
    }

    pub fn body_read_timeout(&self) -> Duration {
        Duration::from_millis(self.body_read_timeout_ms)
    }

    /// Reject invalid values before a pipeline is built from this config.
    pub fn validate(&self) -> Result<(), EgressError> {
        if !(MIN_BODY_SIZE_LIMIT..=MAX_BODY_SIZE_LIMIT).contains(&self.body_size_limit) {
            return Err(EgressError::config(format!(
                "body_size_limit must be within {MIN_BODY_SIZE_LIMIT}..={MAX_BODY_SIZE_LIMIT}, got {}",
                self.body_size_limit
            )));
        }
        if !(MIN_BODY_READ_TIMEOUT_MS..=MAX_BODY_READ_TIMEOUT_MS)
            .contains(&self.body_read_timeout_ms)
        {
            return Err(EgressError::config(format!(
                "body_read_timeout_ms must be within {MIN_BODY_READ_TIMEOUT_MS}..={MAX_BODY_READ_TIMEOUT_MS}, got {}",
                self.body_read_timeout_ms
            )));
        }
        if self.pool_capacity > MAX_POOL_CAPACITY {
            return Err(EgressError::config(format!(
                "pool_capacity must be at most {MAX_POOL_CAPACITY}, got {}",
                self.pool_capacity
            )));
        }
        validate_headers("request_headers", &self.request_headers)?;
        validate_headers("response_headers", &self.response_headers)?;

        for (name, class) in &self.route_parameters {
            if name.is_empty() {
                return Err(EgressError::config("route_parameters: empty parameter name"));
            }
            if class.as_str().is_empty() {
                return Err(EgressError::config(format!(
                    "route_parameters.{name}: empty classification"
                )));
            }
        }
        for content_type in self
            .request_body_content_types
            .iter()
            .chain(&self.response_body_content_types)
        {
            if !content_type.contains('/') {
                return Err(EgressError::config(format!(
                    "invalid body content type '{content_type}'"
                )));
            }
        }
        for enricher in &self.enrichers {
            if enricher.name.is_empty() {
                return Err(EgressError::config("enrichers: empty enricher name"));
            }
        }
        Ok(())
    }
}

fn validate_headers(field: &str, headers: &[HeaderClassification]) -> Result<(), EgressError> {
    let mut seen = HashSet::with_capacity(headers.len());
    for header in headers {
        if http::HeaderName::from_bytes(header.name.as_bytes()).is_err() {
            return Err(EgressError::config(format!(
                "{field}: invalid header name '{}'",
                header.name
            )));
        }
        if header.classification.as_str().is_empty() {
            return Err(EgressError::config(format!(
                "{field}.{}: empty classification",
                header.name
            )));
        }
        if !seen.insert(header.name.to_ascii_lowercase()) {
            return Err(EgressError::config(format!(
                "{field}: duplicate header '{}'",
                header.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Default values ────────────────────────────────────────────

    #[test]
    fn default_config_has_expected_values() {
        let cfg = LoggingConfig::default();
        assert!(!cfg.log_request_start);
        assert!(!cfg.log_request_headers());
        assert!(!cfg.log_response_headers());
        assert!(!cfg.log_body);
        assert_eq!(cfg.body_size_limit, 32 * 1024);
        assert_eq!(cfg.body_read_timeout(), Duration::from_secs(1));
        assert_eq!(cfg.path_redaction_mode, RedactionMode::Strict);
        assert_eq!(cfg.path_logging_mode, PathLoggingMode::Formatted);
        assert_eq!(cfg.pool_capacity, 1024);
        assert!(cfg.enrichers.is_empty());
    }

    #[test]
    fn default_config_is_valid() {
        assert!(LoggingConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_yaml_uses_defaults() {
        let cfg: LoggingConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg.body_size_limit, 32 * 1024);
        assert_eq!(cfg.pool_capacity, 1024);
    }

    // ── Validation ────────────────────────────────────────────────

    #[test]
    fn body_size_limit_out_of_range_rejected() {
        let cfg = LoggingConfig {
            body_size_limit: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(EgressError::Config(_))));

        let cfg = LoggingConfig {
            body_size_limit: MAX_BODY_SIZE_LIMIT + 1,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn body_read_timeout_out_of_range_rejected() {
        let cfg = LoggingConfig {
            body_read_timeout_ms: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = LoggingConfig {
            body_read_timeout_ms: 120_000,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn duplicate_header_names_rejected_case_insensitively() {
        let cfg = LoggingConfig {
            request_headers: vec![
                HeaderClassification::new("X-User", DataClassification::new("private")),
                HeaderClassification::new("x-user", DataClassification::NONE),
            ],
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate header"));
    }

    #[test]
    fn invalid_header_name_rejected() {
        let cfg = LoggingConfig {
            response_headers: vec![HeaderClassification::new(
                "bad header",
                DataClassification::NONE,
            )],
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_classification_rejected() {
        let cfg = LoggingConfig {
            route_parameters: HashMap::from([(
                "userId".to_string(),
                DataClassification::new(""),
            )]),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn invalid_content_type_rejected() {
        let cfg = LoggingConfig {
            log_body: true,
            request_body_content_types: vec!["json".into()],
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn header_logging_flags_follow_lists() {
        let cfg = LoggingConfig {
            request_headers: vec![HeaderClassification::new(
                "accept",
                DataClassification::NONE,
            )],
            ..Default::default()
        };
        assert!(cfg.log_request_headers());
        assert!(!cfg.log_response_headers());
    }
}
