//! Header copy enricher.
//!
//! Copies selected request and response header values into the property bag
//! under `<prefix><header-name>`. Header names are matched case-insensitively
//! and stored lower-cased. Multiple values are joined with `,`.
//!
//! Only copy headers that carry no sensitive data: values are not passed
//! through the redactor.
//!
//! # Example enricher config
//!
//! ```yaml
//! enrichers:
//!   - name: header-copy
//!     config:
//!       prefix: "hdr."
//!       request: [x-correlation-id]
//!       response: [x-ratelimit-remaining, server]
//! ```

use egress_core::{InboundResponse, OutboundRequest, PropertyBag};
use egress_enrich::{Enricher, EnricherFactory};
use http::{HeaderMap, HeaderName};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
struct HeaderCopyConfig {
    #[serde(default)]
    prefix: String,
    #[serde(default)]
    request: Vec<String>,
    #[serde(default)]
    response: Vec<String>,
}

pub struct HeaderCopyFactory;

impl EnricherFactory for HeaderCopyFactory {
    fn name(&self) -> &str {
        "header-copy"
    }

    fn check_config(&self, config: &serde_json::Value) -> anyhow::Result<()> {
        build(config).map(|_| ())
    }

    fn configure(&self, config: &serde_json::Value) -> anyhow::Result<Box<dyn Enricher>> {
        Ok(Box::new(build(config)?))
    }
}

fn build(config: &serde_json::Value) -> anyhow::Result<HeaderCopyEnricher> {
    let cfg: HeaderCopyConfig = if config.is_null() {
        HeaderCopyConfig::default()
    } else {
        serde_json::from_value(config.clone())?
    };
    let names = |list: &[String]| -> anyhow::Result<Vec<(HeaderName, String)>> {
        list.iter()
            .map(|raw| {
                let name = HeaderName::from_bytes(raw.as_bytes())
                    .map_err(|_| anyhow::anyhow!("invalid header name '{raw}'"))?;
                let key = format!("{}{}", cfg.prefix, name.as_str());
                Ok((name, key))
            })
            .collect()
    };
    Ok(HeaderCopyEnricher {
        request: names(&cfg.request)?,
        response: names(&cfg.response)?,
    })
}

struct HeaderCopyEnricher {
    /// `(header, property key)`
    request: Vec<(HeaderName, String)>,
    response: Vec<(HeaderName, String)>,
}

impl Enricher for HeaderCopyEnricher {
    fn name(&self) -> &str {
        "header-copy"
    }

    fn enrich(
        &self,
        bag: &mut PropertyBag,
        request: &OutboundRequest,
        response: Option<&InboundResponse>,
    ) -> anyhow::Result<()> {
        copy(&self.request, request.headers(), bag);
        if let Some(response) = response {
            copy(&self.response, response.headers(), bag);
        }
        Ok(())
    }
}

fn copy(names: &[(HeaderName, String)], headers: &HeaderMap, bag: &mut PropertyBag) {
    for (name, key) in names {
        let mut joined = String::new();
        for value in headers.get_all(name) {
            if !joined.is_empty() {
                joined.push(',');
            }
            joined.push_str(&String::from_utf8_lossy(value.as_bytes()));
        }
        if headers.contains_key(name) {
            bag.add(key, joined);
        }
    }
}
