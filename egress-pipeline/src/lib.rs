pub mod body;
pub mod headers;
pub mod interceptor;
pub mod pools;
pub mod reader;
pub mod request_reader;
pub mod response_reader;

pub use body::{BodyReader, BodySide};
pub use interceptor::{CallContext, CallFailure, CallLogger, EnrichingCallLogger};
pub use pools::{RecordPoolStats, RecordPools};
pub use reader::{CallReader, HttpCallReader};
