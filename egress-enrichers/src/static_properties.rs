//! Static properties enricher.
//!
//! Adds a fixed set of key/value pairs to every record, typically the
//! service name, region or deployment ring.
//!
//! # Example enricher config
//!
//! ```yaml
//! enrichers:
//!   - name: static-properties
//!     config:
//!       properties:
//!         service: checkout
//!         region: eu-west-1
//! ```

use egress_core::{InboundResponse, OutboundRequest, PropertyBag};
use egress_enrich::{Enricher, EnricherFactory};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize, Clone, Default)]
struct StaticPropertiesConfig {
    #[serde(default)]
    properties: BTreeMap<String, String>,
}

pub struct StaticPropertiesFactory;

impl EnricherFactory for StaticPropertiesFactory {
    fn name(&self) -> &str {
        "static-properties"
    }

    fn check_config(&self, config: &serde_json::Value) -> anyhow::Result<()> {
        let cfg = parse(config)?;
        if cfg.properties.keys().any(|k| k.is_empty()) {
            anyhow::bail!("property keys must not be empty");
        }
        Ok(())
    }

    fn configure(&self, config: &serde_json::Value) -> anyhow::Result<Box<dyn Enricher>> {
        let cfg = parse(config)?;
        Ok(Box::new(StaticPropertiesEnricher {
            properties: cfg.properties.into_iter().collect(),
        }))
    }
}

fn parse(config: &serde_json::Value) -> anyhow::Result<StaticPropertiesConfig> {
    if config.is_null() {
        return Ok(StaticPropertiesConfig::default());
    }
    Ok(serde_json::from_value(config.clone())?)
}

struct StaticPropertiesEnricher {
    properties: Vec<(String, String)>,
}

impl Enricher for StaticPropertiesEnricher {
    fn name(&self) -> &str {
        "static-properties"
    }

    fn enrich(
        &self,
        bag: &mut PropertyBag,
        _request: &OutboundRequest,
        _response: Option<&InboundResponse>,
    ) -> anyhow::Result<()> {
        for (key, value) in &self.properties {
            bag.add(key, value.as_str());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> OutboundRequest {
        http::Request::builder().uri("/").body(bytes::Bytes::new()).unwrap()
    }

    #[test]
    fn test_adds_properties_in_key_order() {
        let enricher = StaticPropertiesFactory
            .configure(&json!({"properties": {"service": "checkout", "region": "eu"}}))
            .unwrap();
        let mut bag = PropertyBag::new();
        enricher.enrich(&mut bag, &request(), None).unwrap();
        let entries: Vec<_> = bag.iter().collect();
        assert_eq!(entries, vec![("region", "eu"), ("service", "checkout")]);
    }

    #[test]
    fn test_null_config_adds_nothing() {
        let enricher = StaticPropertiesFactory.configure(&serde_json::Value::Null).unwrap();
        let mut bag = PropertyBag::new();
        enricher.enrich(&mut bag, &request(), None).unwrap();
        assert!(bag.is_empty());
    }

    #[test]
    fn test_rejects_non_string_values() {
        assert!(StaticPropertiesFactory
            .check_config(&json!({"properties": {"retries": 3}}))
            .is_err());
    }

    #[test]
    fn test_rejects_empty_key() {
        assert!(StaticPropertiesFactory
            .check_config(&json!({"properties": {"": "x"}}))
            .is_err());
    }
}
