use crate::body::{BodyReader, BodySide};
use crate::headers::HeadersReader;
use egress_core::{
    EgressError, HeaderList, LogRecord, LoggingConfig, OutboundRequest, PathLoggingMode, Pooled,
    RedactionMode, RequestMetadata,
};
use egress_observability::Redactor;
use egress_observability::path::{self, ParameterClasses};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Written for host or path when it cannot be determined.
pub const UNKNOWN: &str = "unknown";

/// Fills the request side of a record: method, host, redacted path and,
/// when enabled, headers and body.
pub struct RequestReader {
    redactor: Arc<dyn Redactor>,
    redaction_mode: RedactionMode,
    path_mode: PathLoggingMode,
    route_parameters: ParameterClasses,
    headers: HeadersReader,
    body: Option<BodyReader>,
}

impl RequestReader {
    pub fn new(config: &LoggingConfig, redactor: Arc<dyn Redactor>) -> Result<Self, EgressError> {
        Ok(Self {
            redactor,
            redaction_mode: config.path_redaction_mode,
            path_mode: config.path_logging_mode,
            route_parameters: config.route_parameters.clone(),
            headers: HeadersReader::new(&config.request_headers)?,
            body: BodyReader::from_config(config),
        })
    }

    /// Populate `record` from `request`. Headers are only read when the caller
    /// acquired a buffer for them.
    pub async fn read(
        &self,
        record: &mut LogRecord,
        request: &OutboundRequest,
        headers: Option<Pooled<HeaderList>>,
        cancel: &CancellationToken,
    ) {
        record.method.push_str(request.method().as_str());
        record
            .host
            .push_str(request.uri().host().unwrap_or(UNKNOWN));
        self.read_path(record, request);

        if let Some(mut buf) = headers {
            self.headers
                .read(request.headers(), self.redactor.as_ref(), &mut buf);
            record.request_headers = Some(buf);
        }

        if let Some(body) = &self.body {
            match body
                .read(BodySide::Request, request.headers(), request.body(), cancel)
                .await
            {
                Ok(text) => record.request_body = text,
                Err(e) => tracing::debug!(error = %e, "Request body not logged"),
            }
        }
    }

    fn read_path(&self, record: &mut LogRecord, request: &OutboundRequest) {
        let raw = request.uri().path();
        if self.redaction_mode == RedactionMode::None
            && self.path_mode == PathLoggingMode::Formatted
        {
            record.path.push_str(raw);
            return;
        }
        let Some(meta) = RequestMetadata::of(request) else {
            let path = match self.redaction_mode {
                RedactionMode::None => raw,
                _ => UNKNOWN,
            };
            record.path.push_str(path);
            return;
        };
        let template = meta.route.as_ref();
        match self.path_mode {
            PathLoggingMode::Formatted => path::format_path(
                template,
                raw,
                self.redaction_mode,
                &self.route_parameters,
                self.redactor.as_ref(),
                &mut record.path,
            ),
            PathLoggingMode::Structured => {
                record.path.push_str(template.as_str());
                path::collect_parameters(
                    template,
                    raw,
                    self.redaction_mode,
                    &self.route_parameters,
                    self.redactor.as_ref(),
                    &mut record.path_parameters,
                );
            }
        }
    }
}
