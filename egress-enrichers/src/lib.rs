pub mod call_id;
pub mod header_copy;
pub mod request_metadata;
pub mod static_properties;

use egress_enrich::EnricherRegistry;
use std::sync::Arc;

/// Register all built-in enrichers.
pub fn register_all(registry: &mut EnricherRegistry) {
    registry.register(Arc::new(static_properties::StaticPropertiesFactory));
    registry.register(Arc::new(header_copy::HeaderCopyFactory));
    registry.register(Arc::new(request_metadata::RequestMetadataFactory));
    registry.register(Arc::new(call_id::CallIdFactory));
}
