use egress_core::{InboundResponse, OutboundRequest, PropertyBag};
use serde_json::Value;

/// Contributes extra key/value telemetry to a call's record.
///
/// Called once per finished call, after the response (if any) was read.
/// `response` is `None` when the call failed before a response arrived.
/// Errors and panics are contained by the fan-out: they are logged and the
/// remaining enrichers still run.
pub trait Enricher: Send + Sync {
    /// Enricher name, used in diagnostics.
    fn name(&self) -> &str;

    fn enrich(
        &self,
        bag: &mut PropertyBag,
        request: &OutboundRequest,
        response: Option<&InboundResponse>,
    ) -> anyhow::Result<()>;
}

/// Builds configured [`Enricher`] instances. Registered once at startup.
pub trait EnricherFactory: Send + Sync {
    /// Factory name (must be unique), referenced from configuration.
    fn name(&self) -> &str;

    /// Validate enricher configuration.
    fn check_config(&self, config: &Value) -> anyhow::Result<()> {
        let _ = config;
        Ok(())
    }

    /// Create an enricher bound to `config`.
    fn configure(&self, config: &Value) -> anyhow::Result<Box<dyn Enricher>>;
}
