use chrono::Utc;
use egress_core::{LogRecord, Severity};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::error::Error;

/// Target used for every outgoing-call record written through `tracing`.
pub const OUTGOING_TARGET: &str = "egress::outgoing";

/// Sink for finished records.
///
/// The record is borrowed: it goes back to its pool as soon as `emit`
/// returns, so implementations must copy anything they keep.
pub trait RecordEmitter: Send + Sync {
    fn emit(
        &self,
        record: &LogRecord,
        severity: Severity,
        failure: Option<&(dyn Error + 'static)>,
    );
}

// ─────────────────────────────────────────────────────────────
// tracing
// ─────────────────────────────────────────────────────────────

/// Writes each record as one `tracing` event on [`OUTGOING_TARGET`].
///
/// Scalar fields are recorded individually; headers, bodies and enrichment
/// properties go into a compact JSON `details` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEmitter;

macro_rules! outgoing_event {
    ($level:ident, $record:ident, $details:ident, $failure:ident) => {
        tracing::$level!(
            target: OUTGOING_TARGET,
            method = %$record.method,
            host = %$record.host,
            path = %$record.path,
            status_code = $record.status_code,
            duration_ms = $record.duration_ms,
            details = $details,
            error = $failure,
            "outgoing request"
        )
    };
}

impl RecordEmitter for TracingEmitter {
    fn emit(
        &self,
        record: &LogRecord,
        severity: Severity,
        failure: Option<&(dyn Error + 'static)>,
    ) {
        let details = details_json(record);
        let details = details.as_deref();
        let failure = failure.map(tracing::field::display);
        match severity {
            Severity::Information => outgoing_event!(info, record, details, failure),
            Severity::Error => outgoing_event!(error, record, details, failure),
        }
    }
}

/// JSON object with the non-scalar parts of a record, `None` when empty.
///
/// Headers and enrichment keep their capture order.
fn details_json(record: &LogRecord) -> Option<String> {
    let details = record.details();
    if details.is_empty() {
        return None;
    }
    serde_json::to_string(&details).ok()
}

// ─────────────────────────────────────────────────────────────
// In-memory collector
// ─────────────────────────────────────────────────────────────

/// Owned copy of an emitted record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmittedRecord {
    /// RFC 3339 UTC time of emission.
    pub timestamp: String,
    pub severity: Severity,
    pub method: String,
    pub host: String,
    pub path: String,
    #[serde(default)]
    pub path_parameters: Vec<(String, String)>,
    pub status_code: Option<u16>,
    pub duration_ms: u64,
    pub request_headers: Option<Vec<(String, String)>>,
    pub response_headers: Option<Vec<(String, String)>>,
    pub request_body: Option<String>,
    pub response_body: Option<String>,
    #[serde(default)]
    pub enrichment: Vec<(String, String)>,
    /// Display form of the transport failure, for failed calls.
    pub failure: Option<String>,
}

impl EmittedRecord {
    pub fn capture(
        record: &LogRecord,
        severity: Severity,
        failure: Option<&(dyn Error + 'static)>,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            severity,
            method: record.method.clone(),
            host: record.host.clone(),
            path: record.path.clone(),
            path_parameters: record.path_parameters.clone(),
            status_code: record.status_code,
            duration_ms: record.duration_ms,
            request_headers: record.request_headers.as_deref().cloned(),
            response_headers: record.response_headers.as_deref().cloned(),
            request_body: record.request_body.clone(),
            response_body: record.response_body.clone(),
            enrichment: record
                .enrichment
                .as_deref()
                .map(|bag| {
                    bag.iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect()
                })
                .unwrap_or_default(),
            failure: failure.map(|e| e.to_string()),
        }
    }

    pub fn request_header(&self, name: &str) -> Option<&str> {
        lookup(self.request_headers.as_deref()?, name)
    }

    pub fn response_header(&self, name: &str) -> Option<&str> {
        lookup(self.response_headers.as_deref()?, name)
    }

    pub fn enrichment_value(&self, key: &str) -> Option<&str> {
        self.enrichment
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

fn lookup<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Keeps a copy of every emitted record in memory.
#[derive(Debug, Default)]
pub struct CollectingEmitter {
    records: Mutex<Vec<EmittedRecord>>,
}

impl CollectingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<EmittedRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn latest(&self) -> Option<EmittedRecord> {
        self.records.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl RecordEmitter for CollectingEmitter {
    fn emit(
        &self,
        record: &LogRecord,
        severity: Severity,
        failure: Option<&(dyn Error + 'static)>,
    ) {
        let captured = EmittedRecord::capture(record, severity, failure);
        self.records.lock().push(captured);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egress_core::{HeaderList, ObjectPool, PropertyBag};

    fn sample_record(
        headers: &ObjectPool<HeaderList>,
        bags: &ObjectPool<PropertyBag>,
    ) -> LogRecord {
        let mut record = LogRecord::default();
        record.method.push_str("POST");
        record.host.push_str("api.example.com");
        record.path.push_str("v1/orders");
        record.status_code = Some(201);
        record.duration_ms = 42;
        let mut buf = headers.acquire();
        buf.push(("X-Request-Id".into(), "r-1".into()));
        record.request_headers = Some(buf);
        let mut bag = bags.acquire();
        bag.add("tenant", "acme");
        record.enrichment = Some(bag);
        record
    }

    #[test]
    fn collecting_emitter_copies_record() {
        let headers = ObjectPool::new(1);
        let bags = ObjectPool::new(1);
        let emitter = CollectingEmitter::new();
        {
            let record = sample_record(&headers, &bags);
            emitter.emit(&record, Severity::Information, None);
        }
        let got = emitter.latest().unwrap();
        assert_eq!(got.method, "POST");
        assert_eq!(got.status_code, Some(201));
        assert_eq!(got.duration_ms, 42);
        assert_eq!(got.request_header("x-request-id"), Some("r-1"));
        assert_eq!(got.enrichment_value("tenant"), Some("acme"));
        assert!(got.response_headers.is_none());
        assert!(got.failure.is_none());
        assert_eq!(emitter.len(), 1);
    }

    #[test]
    fn collecting_emitter_records_failure_text() {
        let emitter = CollectingEmitter::new();
        let record = LogRecord::default();
        let err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "peer reset");
        emitter.emit(&record, Severity::Error, Some(&err));
        let got = emitter.latest().unwrap();
        assert_eq!(got.severity, Severity::Error);
        assert_eq!(got.failure.as_deref(), Some("peer reset"));
    }

    #[test]
    fn details_json_contains_nested_fields() {
        let headers = ObjectPool::new(1);
        let bags = ObjectPool::new(1);
        let record = sample_record(&headers, &bags);
        let json: serde_json::Value =
            serde_json::from_str(&details_json(&record).unwrap()).unwrap();
        assert_eq!(json["request_headers"]["X-Request-Id"], "r-1");
        assert_eq!(json["enrichment"]["tenant"], "acme");
        assert!(json.get("response_headers").is_none());
    }

    #[test]
    fn details_json_keeps_capture_order() {
        let headers: ObjectPool<HeaderList> = ObjectPool::new(1);
        let bags: ObjectPool<PropertyBag> = ObjectPool::new(1);
        let mut record = LogRecord::default();
        let mut buf = headers.acquire();
        buf.push(("Z-Second".into(), "z".into()));
        buf.push(("A-First".into(), "a".into()));
        record.request_headers = Some(buf);
        let mut bag = bags.acquire();
        bag.add("zeta", "1");
        bag.add("alpha", "2");
        record.enrichment = Some(bag);
        assert_eq!(
            details_json(&record).unwrap(),
            r#"{"request_headers":{"Z-Second":"z","A-First":"a"},"enrichment":{"zeta":"1","alpha":"2"}}"#
        );
    }

    #[test]
    fn details_json_empty_record_is_none() {
        assert!(details_json(&LogRecord::default()).is_none());
    }

    #[test]
    fn tracing_emitter_does_not_panic_without_subscriber() {
        let headers = ObjectPool::new(1);
        let bags = ObjectPool::new(1);
        let record = sample_record(&headers, &bags);
        TracingEmitter.emit(&record, Severity::Information, None);
        let err = std::io::Error::other("boom");
        TracingEmitter.emit(&record, Severity::Error, Some(&err));
    }
}
