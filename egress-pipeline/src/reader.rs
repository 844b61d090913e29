use crate::request_reader::RequestReader;
use crate::response_reader::ResponseReader;
use async_trait::async_trait;
use egress_core::{
    EgressError, HeaderList, InboundResponse, LogRecord, LoggingConfig, OutboundRequest, Pooled,
};
use egress_observability::Redactor;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Populates a record from the two halves of a call.
///
/// Header buffers are passed in only when header logging is enabled for that
/// side; a reader that is handed one must either store it on the record or
/// drop it.
#[async_trait]
pub trait CallReader: Send + Sync {
    async fn read_request(
        &self,
        record: &mut LogRecord,
        request: &OutboundRequest,
        headers: Option<Pooled<HeaderList>>,
        cancel: &CancellationToken,
    ) -> Result<(), EgressError>;

    /// `response` is `None` for calls that failed before a response arrived.
    async fn read_response(
        &self,
        record: &mut LogRecord,
        response: Option<&InboundResponse>,
        headers: Option<Pooled<HeaderList>>,
        cancel: &CancellationToken,
    ) -> Result<(), EgressError>;
}

/// Default [`CallReader`] for `http` messages.
pub struct HttpCallReader {
    request: RequestReader,
    response: ResponseReader,
}

impl HttpCallReader {
    pub fn new(config: &LoggingConfig, redactor: Arc<dyn Redactor>) -> Result<Self, EgressError> {
        Ok(Self {
            request: RequestReader::new(config, Arc::clone(&redactor))?,
            response: ResponseReader::new(config, redactor)?,
        })
    }
}

#[async_trait]
impl CallReader for HttpCallReader {
    async fn read_request(
        &self,
        record: &mut LogRecord,
        request: &OutboundRequest,
        headers: Option<Pooled<HeaderList>>,
        cancel: &CancellationToken,
    ) -> Result<(), EgressError> {
        self.request.read(record, request, headers, cancel).await;
        Ok(())
    }

    async fn read_response(
        &self,
        record: &mut LogRecord,
        response: Option<&InboundResponse>,
        headers: Option<Pooled<HeaderList>>,
        cancel: &CancellationToken,
    ) -> Result<(), EgressError> {
        self.response.read(record, response, headers, cancel).await;
        Ok(())
    }
}
