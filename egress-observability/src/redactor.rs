//! Redaction of header values and route parameters.
//!
//! The pipeline never decides *how* a value is masked; it hands the raw value
//! and its [`DataClassification`] to a [`Redactor`]. Values classified
//! [`DataClassification::NONE`] bypass the redactor entirely.
//!
//! ```
//! use egress_core::DataClassification;
//! use egress_observability::redactor::{FormatRedactor, Redactor};
//!
//! let redactor = FormatRedactor::new("REDACTED:{0}");
//! let private = DataClassification::new("private");
//! assert_eq!(redactor.redact("123", &private), "REDACTED:123");
//! ```

use egress_core::DataClassification;

/// Fixed marker written for route parameters that have no classification
/// when the path is redacted in strict mode.
pub const REDACTED: &str = "REDACTED";

/// Placeholder replaced by the raw value in [`FormatRedactor`] formats.
pub const VALUE_PLACEHOLDER: &str = "{0}";

/// Turns a classified raw value into its loggable form.
pub trait Redactor: Send + Sync {
    fn redact(&self, value: &str, classification: &DataClassification) -> String;

    /// Append the redacted form of `value` to `out`.
    fn redact_into(&self, value: &str, classification: &DataClassification, out: &mut String) {
        out.push_str(&self.redact(value, classification));
    }
}

/// Redact `value` into `out`, passing it through untouched when it is
/// classified as safe.
#[inline]
pub fn apply(
    redactor: &dyn Redactor,
    value: &str,
    classification: &DataClassification,
    out: &mut String,
) {
    if classification.is_none() {
        out.push_str(value);
    } else {
        redactor.redact_into(value, classification, out);
    }
}

// ─────────────────────────────────────────────────────────────
// Built-in redactors
// ─────────────────────────────────────────────────────────────

/// Replaces every classified value with an empty string.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErasingRedactor;

impl Redactor for ErasingRedactor {
    fn redact(&self, _value: &str, _classification: &DataClassification) -> String {
        String::new()
    }

    fn redact_into(&self, _value: &str, _classification: &DataClassification, _out: &mut String) {}
}

/// Renders classified values through a format string where `{0}` stands for
/// the raw value, e.g. `REDACTED:{0}` or `[masked]`.
#[derive(Debug, Clone)]
pub struct FormatRedactor {
    format: String,
}

impl FormatRedactor {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }

    pub fn format(&self) -> &str {
        &self.format
    }
}

impl Redactor for FormatRedactor {
    fn redact(&self, value: &str, classification: &DataClassification) -> String {
        let mut out = String::with_capacity(self.format.len() + value.len());
        self.redact_into(value, classification, &mut out);
        out
    }

    fn redact_into(&self, value: &str, _classification: &DataClassification, out: &mut String) {
        let mut rest = self.format.as_str();
        while let Some(idx) = rest.find(VALUE_PLACEHOLDER) {
            out.push_str(&rest[..idx]);
            out.push_str(value);
            rest = &rest[idx + VALUE_PLACEHOLDER.len()..];
        }
        out.push_str(rest);
    }
}

// ─────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────
