//! Call lifecycle: `start` → (`stop` | `fail`).
//!
//! `start` checks a record out of the pipeline's pool and fills the request
//! side. The record travels inside the returned [`CallContext`] until the
//! transport hands it back to `stop` or `fail`, which read the response, run
//! the enrichers, classify severity, emit, and return every pooled object.
//!
//! Pooled objects are scope guards, so a context that is dropped without a
//! terminal hook (cancelled call) still goes back to its pool.

use crate::pools::{RecordPoolStats, RecordPools};
use crate::reader::{CallReader, HttpCallReader};
use async_trait::async_trait;
use egress_core::severity;
use egress_core::{
    EgressError, InboundResponse, LogRecord, LoggingConfig, OutboundRequest, Pooled, Severity,
};
use egress_enrich::{EnricherRegistry, EnricherSet};
use egress_observability::{RecordEmitter, Redactor};
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

static NEXT_LOGGER_ID: AtomicU64 = AtomicU64::new(1);

/// Transport failure handed to [`CallLogger::fail`].
pub type CallFailure = dyn Error + Send + Sync + 'static;

/// Opaque handle tying `start` to the matching `stop` / `fail`.
pub struct CallContext {
    owner: u64,
    record: Pooled<LogRecord>,
    started_at: Instant,
}

impl CallContext {
    /// Time since `start` was entered.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Request-side view of the in-flight record.
    pub fn record(&self) -> &LogRecord {
        &self.record
    }
}

impl std::fmt::Debug for CallContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallContext")
            .field("owner", &self.owner)
            .field("method", &self.record.method)
            .field("path", &self.record.path)
            .finish()
    }
}

/// Lifecycle hooks a transport invokes once per call.
///
/// `stop` and `fail` take the context as an `Option` so a transport that lost
/// it gets [`EgressError::MissingContext`] instead of a silent no-op.
#[async_trait]
pub trait CallLogger: Send + Sync {
    async fn start(
        &self,
        request: &OutboundRequest,
        cancel: &CancellationToken,
    ) -> Result<CallContext, EgressError>;

    async fn stop(
        &self,
        context: Option<CallContext>,
        request: &OutboundRequest,
        response: &InboundResponse,
        elapsed: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), EgressError>;

    async fn fail(
        &self,
        context: Option<CallContext>,
        request: &OutboundRequest,
        response: Option<&InboundResponse>,
        failure: &CallFailure,
        elapsed: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), EgressError>;

    /// Synchronous start. Not supported unless overridden.
    fn start_blocking(&self, _request: &OutboundRequest) -> Result<CallContext, EgressError> {
        Err(EgressError::Unsupported("synchronous start"))
    }

    /// Synchronous stop. Not supported unless overridden; the context is
    /// released either way.
    fn stop_blocking(
        &self,
        _context: Option<CallContext>,
        _request: &OutboundRequest,
        _response: &InboundResponse,
        _elapsed: Duration,
    ) -> Result<(), EgressError> {
        Err(EgressError::Unsupported("synchronous stop"))
    }
}

/// The pipeline: reader, enrichers and emitter over its own pools.
pub struct EnrichingCallLogger {
    id: u64,
    log_request_start: bool,
    log_request_headers: bool,
    log_response_headers: bool,
    pools: RecordPools,
    reader: Arc<dyn CallReader>,
    enrichers: EnricherSet,
    emitter: Arc<dyn RecordEmitter>,
}

impl EnrichingCallLogger {
    /// Build a pipeline with the default `http` reader.
    pub fn new(
        config: &LoggingConfig,
        redactor: Arc<dyn Redactor>,
        enrichers: EnricherSet,
        emitter: Arc<dyn RecordEmitter>,
    ) -> Result<Self, EgressError> {
        config.validate()?;
        let reader = Arc::new(HttpCallReader::new(config, redactor)?);
        Ok(Self::with_reader(config, reader, enrichers, emitter))
    }

    /// Build a pipeline whose enrichers come from `config.enrichers`.
    pub fn from_registry(
        config: &LoggingConfig,
        redactor: Arc<dyn Redactor>,
        registry: &EnricherRegistry,
        emitter: Arc<dyn RecordEmitter>,
    ) -> Result<Self, EgressError> {
        let enrichers = registry.build(&config.enrichers)?;
        Self::new(config, redactor, enrichers, emitter)
    }

    /// Build a pipeline around a custom reader.
    pub fn with_reader(
        config: &LoggingConfig,
        reader: Arc<dyn CallReader>,
        enrichers: EnricherSet,
        emitter: Arc<dyn RecordEmitter>,
    ) -> Self {
        let logger = Self {
            id: NEXT_LOGGER_ID.fetch_add(1, Ordering::Relaxed),
            log_request_start: config.log_request_start,
            log_request_headers: config.log_request_headers(),
            log_response_headers: config.log_response_headers(),
            pools: RecordPools::new(config.pool_capacity),
            reader,
            enrichers,
            emitter,
        };
        tracing::debug!(
            logger = logger.id,
            enrichers = ?logger.enrichers.names(),
            pool_capacity = config.pool_capacity,
            "Call logger ready"
        );
        logger
    }

    pub fn pool_stats(&self) -> RecordPoolStats {
        self.pools.stats()
    }

    pub fn enrichers(&self) -> &EnricherSet {
        &self.enrichers
    }

    fn claim(&self, context: Option<CallContext>) -> Result<CallContext, EgressError> {
        let context = context.ok_or(EgressError::MissingContext)?;
        if context.owner != self.id {
            return Err(EgressError::InvalidContext);
        }
        Ok(context)
    }

    /// Shared tail of `stop` and `fail`. The context is consumed, so the
    /// record and its buffers go back to their pools when this returns.
    async fn complete(
        &self,
        mut call: CallContext,
        request: &OutboundRequest,
        response: Option<&InboundResponse>,
        failure: Option<&CallFailure>,
        elapsed: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), EgressError> {
        let headers = (self.log_response_headers && response.is_some())
            .then(|| self.pools.headers.acquire());
        if let Err(e) = self
            .reader
            .read_response(&mut call.record, response, headers, cancel)
            .await
        {
            if e.is_usage_error() {
                return Err(e);
            }
            tracing::warn!(error = %e, "Failed to read response");
        }

        if !self.enrichers.is_empty() {
            let mut bag = self.pools.bags.acquire();
            self.enrichers.enrich(&mut bag, request, response);
            call.record.enrichment = Some(bag);
        }

        call.record.duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let severity = severity::classify(call.record.status_code, failure.is_some());
        let failure = failure.map(|f| f as &(dyn Error + 'static));
        self.emitter.emit(&call.record, severity, failure);
        Ok(())
    }
}

#[async_trait]
impl CallLogger for EnrichingCallLogger {
    async fn start(
        &self,
        request: &OutboundRequest,
        cancel: &CancellationToken,
    ) -> Result<CallContext, EgressError> {
        let started_at = Instant::now();
        let mut record = self.pools.records.acquire();
        let headers = self
            .log_request_headers
            .then(|| self.pools.headers.acquire());
        if let Err(e) = self
            .reader
            .read_request(&mut record, request, headers, cancel)
            .await
        {
            if e.is_usage_error() {
                return Err(e);
            }
            tracing::warn!(error = %e, "Failed to read request");
        }
        if self.log_request_start {
            self.emitter.emit(&record, Severity::Information, None);
        }
        Ok(CallContext {
            owner: self.id,
            record,
            started_at,
        })
    }

    async fn stop(
        &self,
        context: Option<CallContext>,
        request: &OutboundRequest,
        response: &InboundResponse,
        elapsed: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), EgressError> {
        let call = self.claim(context)?;
        self.complete(call, request, Some(response), None, elapsed, cancel)
            .await
    }

    async fn fail(
        &self,
        context: Option<CallContext>,
        request: &OutboundRequest,
        response: Option<&InboundResponse>,
        failure: &CallFailure,
        elapsed: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), EgressError> {
        let call = self.claim(context)?;
        self.complete(call, request, response, Some(failure), elapsed, cancel)
            .await
    }
}
