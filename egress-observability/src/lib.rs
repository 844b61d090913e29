pub mod emitter;
pub mod path;
pub mod redactor;

pub use emitter::{CollectingEmitter, EmittedRecord, RecordEmitter, TracingEmitter};
pub use redactor::{ErasingRedactor, FormatRedactor, Redactor};
