use crate::pool::{Pooled, Recycle};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Ordered `(name, value)` pairs captured from request or response headers.
pub type HeaderList = Vec<(String, String)>;

/// Ordered key/value telemetry contributed by enrichers.
///
/// Keys keep their first-insertion position; writing an existing key replaces
/// its value (last write wins).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PropertyBag {
    entries: Vec<(String, String)>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Recycle for PropertyBag {
    fn recycle(&mut self) -> bool {
        Recycle::recycle(&mut self.entries)
    }
}

impl Serialize for PropertyBag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_pairs(&self.entries, serializer)
    }
}

/// Per-call record. Borrowed from a pool at call start, returned after emission.
///
/// Header lists and the property bag are themselves pooled; resetting the
/// record drops their guards, which hands them back to their own pools.
#[derive(Debug, Default)]
pub struct LogRecord {
    pub method: String,
    pub host: String,
    /// Outgoing path after redaction (or the route template in structured mode).
    pub path: String,
    /// Redacted route parameters, only filled in structured path mode.
    pub path_parameters: Vec<(String, String)>,
    pub status_code: Option<u16>,
    pub duration_ms: u64,
    pub request_headers: Option<Pooled<HeaderList>>,
    pub response_headers: Option<Pooled<HeaderList>>,
    pub request_body: Option<String>,
    pub response_body: Option<String>,
    pub enrichment: Option<Pooled<PropertyBag>>,
}

impl LogRecord {
    /// Reset to the empty state, keeping string capacity.
    pub fn reset(&mut self) {
        self.method.clear();
        self.host.clear();
        self.path.clear();
        self.path_parameters.clear();
        self.status_code = None;
        self.duration_ms = 0;
        self.request_headers = None;
        self.response_headers = None;
        self.request_body = None;
        self.response_body = None;
        self.enrichment = None;
    }

    pub fn request_header(&self, name: &str) -> Option<&str> {
        find_pair(self.request_headers.as_deref()?, name)
    }

    pub fn response_header(&self, name: &str) -> Option<&str> {
        find_pair(self.response_headers.as_deref()?, name)
    }

    pub fn enrichment_value(&self, key: &str) -> Option<&str> {
        self.enrichment.as_deref()?.get(key)
    }
}

impl Recycle for LogRecord {
    fn recycle(&mut self) -> bool {
        self.reset();
        true
    }
}

fn find_pair<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Serialize `(name, value)` pairs as a JSON-style object, preserving order.
pub fn serialize_pairs<S: Serializer>(
    pairs: &[(String, String)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(pairs.len()))?;
    for (k, v) in pairs {
        map.serialize_entry(k, v)?;
    }
    map.end()
}

struct Pairs<'a>(&'a [(String, String)]);

impl Serialize for Pairs<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_pairs(self.0, serializer)
    }
}

impl LogRecord {
    /// Borrowed view over the non-scalar parts of the record.
    pub fn details(&self) -> RecordDetails<'_> {
        RecordDetails(self)
    }

    fn serialize_details<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        if !self.path_parameters.is_empty() {
            map.serialize_entry("path_parameters", &Pairs(&self.path_parameters))?;
        }
        if let Some(headers) = self.request_headers.as_deref() {
            map.serialize_entry("request_headers", &Pairs(headers))?;
        }
        if let Some(headers) = self.response_headers.as_deref() {
            map.serialize_entry("response_headers", &Pairs(headers))?;
        }
        if let Some(body) = &self.request_body {
            map.serialize_entry("request_body", body)?;
        }
        if let Some(body) = &self.response_body {
            map.serialize_entry("response_body", body)?;
        }
        if let Some(bag) = self.enrichment.as_deref() {
            map.serialize_entry("enrichment", bag)?;
        }
        Ok(())
    }
}

/// Parameters, headers, bodies and enrichment of a record, serialized as one
/// object in capture order.
#[derive(Clone, Copy)]
pub struct RecordDetails<'a>(&'a LogRecord);

impl RecordDetails<'_> {
    pub fn is_empty(&self) -> bool {
        let r = self.0;
        r.path_parameters.is_empty()
            && r.request_headers.is_none()
            && r.response_headers.is_none()
            && r.request_body.is_none()
            && r.response_body.is_none()
            && r.enrichment.is_none()
    }
}

impl Serialize for RecordDetails<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        self.0.serialize_details(&mut map)?;
        map.end()
    }
}

// Wire contract: field names here are what downstream tooling keys on.
impl Serialize for LogRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("method", &self.method)?;
        map.serialize_entry("host", &self.host)?;
        map.serialize_entry("path", &self.path)?;
        map.serialize_entry("status_code", &self.status_code)?;
        map.serialize_entry("duration_ms", &self.duration_ms)?;
        self.serialize_details(&mut map)?;
        map.end()
    }
}
