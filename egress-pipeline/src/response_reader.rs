use crate::body::{BodyReader, BodySide};
use crate::headers::HeadersReader;
use egress_core::{EgressError, HeaderList, InboundResponse, LogRecord, LoggingConfig, Pooled};
use egress_observability::Redactor;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Fills the response side of a record.
///
/// A missing response (failed call) leaves status, headers and body unset.
pub struct ResponseReader {
    redactor: Arc<dyn Redactor>,
    headers: HeadersReader,
    body: Option<BodyReader>,
}

impl ResponseReader {
    pub fn new(config: &LoggingConfig, redactor: Arc<dyn Redactor>) -> Result<Self, EgressError> {
        Ok(Self {
            redactor,
            headers: HeadersReader::new(&config.response_headers)?,
            body: BodyReader::from_config(config),
        })
    }

    pub async fn read(
        &self,
        record: &mut LogRecord,
        response: Option<&InboundResponse>,
        headers: Option<Pooled<HeaderList>>,
        cancel: &CancellationToken,
    ) {
        let Some(response) = response else {
            return;
        };
        record.status_code = Some(response.status().as_u16());

        if let Some(mut buf) = headers {
            self.headers
                .read(response.headers(), self.redactor.as_ref(), &mut buf);
            record.response_headers = Some(buf);
        }

        if let Some(body) = &self.body {
            match body
                .read(BodySide::Response, response.headers(), response.body(), cancel)
                .await
            {
                Ok(text) => record.response_body = text,
                Err(e) => tracing::debug!(error = %e, "Response body not logged"),
            }
        }
    }
}
