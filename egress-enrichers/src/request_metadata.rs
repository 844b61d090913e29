//! Request metadata enricher.
//!
//! Copies the logical request and dependency names from the
//! [`RequestMetadata`] attached to the request. Requests without metadata
//! get nothing.
//!
//! ```yaml
//! enrichers:
//!   - name: request-metadata
//!     config:
//!       request_name_key: request_name
//!       dependency_name_key: dependency_name
//! ```

use egress_core::{InboundResponse, OutboundRequest, PropertyBag, RequestMetadata};
use egress_enrich::{Enricher, EnricherFactory};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
struct RequestMetadataConfig {
    #[serde(default = "default_request_name_key")]
    request_name_key: String,
    #[serde(default = "default_dependency_name_key")]
    dependency_name_key: String,
}

fn default_request_name_key() -> String {
    "request_name".into()
}
fn default_dependency_name_key() -> String {
    "dependency_name".into()
}

impl Default for RequestMetadataConfig {
    fn default() -> Self {
        Self {
            request_name_key: default_request_name_key(),
            dependency_name_key: default_dependency_name_key(),
        }
    }
}

pub struct RequestMetadataFactory;

impl EnricherFactory for RequestMetadataFactory {
    fn name(&self) -> &str {
        "request-metadata"
    }

    fn configure(&self, config: &serde_json::Value) -> anyhow::Result<Box<dyn Enricher>> {
        let cfg: RequestMetadataConfig = if config.is_null() {
            RequestMetadataConfig::default()
        } else {
            serde_json::from_value(config.clone())?
        };
        Ok(Box::new(RequestMetadataEnricher { cfg }))
    }
}

struct RequestMetadataEnricher {
    cfg: RequestMetadataConfig,
}

impl Enricher for RequestMetadataEnricher {
    fn name(&self) -> &str {
        "request-metadata"
    }

    fn enrich(
        &self,
        bag: &mut PropertyBag,
        request: &OutboundRequest,
        _response: Option<&InboundResponse>,
    ) -> anyhow::Result<()> {
        let Some(meta) = RequestMetadata::of(request) else {
            return Ok(());
        };
        if let Some(name) = &meta.request_name {
            bag.add(&self.cfg.request_name_key, name.as_str());
        }
        if let Some(name) = &meta.dependency_name {
            bag.add(&self.cfg.dependency_name_key, name.as_str());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_copies_names_from_metadata() {
        let enricher = RequestMetadataFactory.configure(&json!({})).unwrap();
        let mut request = http::Request::builder()
            .uri("https://users.internal/v1/users/1")
            .body(bytes::Bytes::new())
            .unwrap();
        RequestMetadata::new("/v1/users/{id}")
            .unwrap()
            .with_request_name("GetUser")
            .with_dependency_name("users-api")
            .attach(&mut request);

        let mut bag = PropertyBag::new();
        enricher.enrich(&mut bag, &request, None).unwrap();
        assert_eq!(bag.get("request_name"), Some("GetUser"));
        assert_eq!(bag.get("dependency_name"), Some("users-api"));
    }

    #[test]
    fn test_custom_keys() {
        let enricher = RequestMetadataFactory
            .configure(&json!({"request_name_key": "op"}))
            .unwrap();
        let mut request = http::Request::builder().uri("/").body(bytes::Bytes::new()).unwrap();
        RequestMetadata::new("/")
            .unwrap()
            .with_request_name("Ping")
            .attach(&mut request);
        let mut bag = PropertyBag::new();
        enricher.enrich(&mut bag, &request, None).unwrap();
        assert_eq!(bag.get("op"), Some("Ping"));
        assert!(bag.get("dependency_name").is_none());
    }

    #[test]
    fn test_no_metadata_is_noop() {
        let enricher = RequestMetadataFactory.configure(&serde_json::Value::Null).unwrap();
        let request = http::Request::builder().uri("/").body(bytes::Bytes::new()).unwrap();
        let mut bag = PropertyBag::new();
        enricher.enrich(&mut bag, &request, None).unwrap();
        assert!(bag.is_empty());
    }
}
