//! Call id enricher.
//!
//! Records the request's correlation header when present, otherwise a fresh
//! UUID v4, so every emitted record can be joined with downstream logs.
//!
//! ```yaml
//! enrichers:
//!   - name: call-id
//!     config:
//!       header: x-request-id
//!       key: call_id
//! ```

use egress_core::{InboundResponse, OutboundRequest, PropertyBag};
use egress_enrich::{Enricher, EnricherFactory};
use http::HeaderName;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
struct CallIdConfig {
    #[serde(default = "default_header")]
    header: String,
    #[serde(default = "default_key")]
    key: String,
}

fn default_header() -> String {
    "x-request-id".into()
}
fn default_key() -> String {
    "call_id".into()
}

pub struct CallIdFactory;

impl EnricherFactory for CallIdFactory {
    fn name(&self) -> &str {
        "call-id"
    }

    fn check_config(&self, config: &serde_json::Value) -> anyhow::Result<()> {
        build(config).map(|_| ())
    }

    fn configure(&self, config: &serde_json::Value) -> anyhow::Result<Box<dyn Enricher>> {
        Ok(Box::new(build(config)?))
    }
}

fn build(config: &serde_json::Value) -> anyhow::Result<CallIdEnricher> {
    let cfg: CallIdConfig = if config.is_null() {
        serde_json::from_value(serde_json::json!({}))?
    } else {
        serde_json::from_value(config.clone())?
    };
    let header = HeaderName::from_bytes(cfg.header.as_bytes())
        .map_err(|_| anyhow::anyhow!("invalid header name '{}'", cfg.header))?;
    if cfg.key.is_empty() {
        anyhow::bail!("key must not be empty");
    }
    Ok(CallIdEnricher {
        header,
        key: cfg.key,
    })
}

struct CallIdEnricher {
    header: HeaderName,
    key: String,
}

impl Enricher for CallIdEnricher {
    fn name(&self) -> &str {
        "call-id"
    }

    fn enrich(
        &self,
        bag: &mut PropertyBag,
        request: &OutboundRequest,
        _response: Option<&InboundResponse>,
    ) -> anyhow::Result<()> {
        let id = match request.headers().get(&self.header).map(|v| v.to_str()) {
            Some(Ok(value)) => value.to_string(),
            Some(Err(_)) => anyhow::bail!("{} is not valid UTF-8", self.header),
            None => uuid::Uuid::new_v4().to_string(),
        };
        bag.add(&self.key, id);
        Ok(())
    }
}
