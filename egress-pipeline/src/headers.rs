use egress_core::config::HeaderClassification;
use egress_core::{DataClassification, EgressError, HeaderList};
use egress_observability::Redactor;
use egress_observability::redactor;
use http::{HeaderMap, HeaderName};

/// Multi-value separator.
pub const VALUE_SEPARATOR: char = ',';

/// Captures a configured set of headers, redacted by classification.
///
/// Headers are recorded in configuration order under their configured
/// spelling; headers absent from the message are skipped.
#[derive(Debug, Clone)]
pub struct HeadersReader {
    headers: Vec<ClassifiedHeader>,
}

#[derive(Debug, Clone)]
struct ClassifiedHeader {
    name: HeaderName,
    label: String,
    classification: DataClassification,
}

impl HeadersReader {
    pub fn new(headers: &[HeaderClassification]) -> Result<Self, EgressError> {
        let headers = headers
            .iter()
            .map(|h| {
                let name = HeaderName::from_bytes(h.name.as_bytes()).map_err(|_| {
                    EgressError::config(format!("invalid header name '{}'", h.name))
                })?;
                Ok(ClassifiedHeader {
                    name,
                    label: h.name.clone(),
                    classification: h.classification.clone(),
                })
            })
            .collect::<Result<Vec<_>, EgressError>>()?;
        Ok(Self { headers })
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Append `(name, redacted value)` for every configured header present
    /// in `map`. Repeated headers are joined with `,` before redaction.
    pub fn read(&self, map: &HeaderMap, redactor: &dyn Redactor, out: &mut HeaderList) {
        let mut raw = String::new();
        for header in &self.headers {
            let mut values = map.get_all(&header.name).iter().peekable();
            if values.peek().is_none() {
                continue;
            }
            raw.clear();
            for (i, value) in values.enumerate() {
                if i > 0 {
                    raw.push(VALUE_SEPARATOR);
                }
                raw.push_str(&String::from_utf8_lossy(value.as_bytes()));
            }
            let mut redacted = String::with_capacity(raw.len());
            redactor::apply(redactor, &raw, &header.classification, &mut redacted);
            out.push((header.label.clone(), redacted));
        }
    }
}
