use egress_core::classification::{DataClassification, PathLoggingMode, RedactionMode};
use egress_core::config::LoggingConfig;
use std::io::Write;

// =============================================================================
// File loading
// =============================================================================

#[test]
fn test_load_full_yaml_config() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(
        file,
        r#"
log_request_start: true
request_headers:
  - name: x-user-id
    classification: private
  - name: accept
    classification: none
response_headers:
  - name: x-served-by
    classification: none
log_body: true
body_size_limit: 4096
request_body_content_types: ["application/json"]
path_redaction_mode: loose
path_logging_mode: structured
route_parameters:
  userId: private
  unitId: none
pool_capacity: 64
enrichers:
  - name: static-properties
    config:
      properties:
        region: eu-west-1
  - name: request-metadata
"#
    )
    .unwrap();

    let cfg = LoggingConfig::load(file.path()).unwrap();
    assert!(cfg.log_request_start);
    assert_eq!(cfg.request_headers.len(), 2);
    assert_eq!(cfg.request_headers[0].name, "x-user-id");
    assert_eq!(
        cfg.request_headers[0].classification,
        DataClassification::new("private")
    );
    assert_eq!(cfg.request_headers[1].classification, DataClassification::NONE);
    assert!(cfg.log_response_headers());
    assert!(cfg.log_body);
    assert_eq!(cfg.body_size_limit, 4096);
    assert_eq!(cfg.path_redaction_mode, RedactionMode::Loose);
    assert_eq!(cfg.path_logging_mode, PathLoggingMode::Structured);
    assert!(cfg.route_parameters["unitId"].is_none());
    assert_eq!(cfg.pool_capacity, 64);
    assert_eq!(cfg.enrichers.len(), 2);
    assert_eq!(cfg.enrichers[0].name, "static-properties");
    assert_eq!(cfg.enrichers[0].config["properties"]["region"], "eu-west-1");
    assert!(cfg.enrichers[1].config.is_null());
}

#[test]
fn test_load_rejects_invalid_values() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(file, "body_size_limit: 0").unwrap();
    let err = LoggingConfig::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("body_size_limit"));
}

#[test]
fn test_load_rejects_unknown_redaction_mode() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(file, "path_redaction_mode: paranoid").unwrap();
    assert!(LoggingConfig::load(file.path()).is_err());
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = LoggingConfig::load(&dir.path().join("absent.yaml")).unwrap();
    assert_eq!(cfg.path_redaction_mode, RedactionMode::Strict);
    assert!(!cfg.log_request_start);
}

// =============================================================================
// Serialization
// =============================================================================

#[test]
fn test_config_serialization_roundtrip() {
    let cfg = LoggingConfig {
        log_request_start: true,
        path_redaction_mode: RedactionMode::None,
        ..Default::default()
    };
    let json = serde_json::to_string(&cfg).unwrap();
    let back: LoggingConfig = serde_json::from_str(&json).unwrap();
    assert!(back.log_request_start);
    assert_eq!(back.path_redaction_mode, RedactionMode::None);
    assert_eq!(back.body_size_limit, cfg.body_size_limit);
}
