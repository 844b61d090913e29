pub mod call;
pub mod classification;
pub mod config;
pub mod error;
pub mod pool;
pub mod record;
pub mod route;
pub mod severity;

pub use call::{InboundResponse, OutboundRequest, RequestMetadata};
pub use classification::{DataClassification, PathLoggingMode, RedactionMode};
pub use config::LoggingConfig;
pub use error::EgressError;
pub use pool::{ObjectPool, PoolStats, Pooled, Recycle};
pub use record::{HeaderList, LogRecord, PropertyBag, RecordDetails};
pub use route::RouteTemplate;
pub use severity::Severity;
