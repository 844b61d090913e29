use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Sensitivity label attached to a header or route parameter.
///
/// The label is opaque to the pipeline; it is only handed to the redactor.
/// [`DataClassification::NONE`] is the explicit "safe to log as-is" marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataClassification(Cow<'static, str>);

impl DataClassification {
    /// Explicitly unclassified: the value is logged verbatim in every mode.
    pub const NONE: DataClassification = DataClassification(Cow::Borrowed("none"));
    /// Classified, but the kind of data is not known.
    pub const UNKNOWN: DataClassification = DataClassification(Cow::Borrowed("unknown"));

    pub fn new(label: impl Into<String>) -> Self {
        Self(Cow::Owned(label.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the unclassified-safe marker.
    pub fn is_none(&self) -> bool {
        self.0.eq_ignore_ascii_case("none")
    }
}

impl std::fmt::Display for DataClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How route parameters found in the outgoing path are redacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedactionMode {
    /// Path is logged exactly as sent.
    None,
    /// Only parameters with a sensitive classification are redacted.
    Loose,
    /// Every parameter is redacted unless classified [`DataClassification::NONE`].
    #[default]
    Strict,
}

impl RedactionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedactionMode::None => "none",
            RedactionMode::Loose => "loose",
            RedactionMode::Strict => "strict",
        }
    }
}

impl std::fmt::Display for RedactionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of the `path` field when route redaction is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathLoggingMode {
    /// The route template filled in with (redacted) parameter values.
    #[default]
    Formatted,
    /// The raw route template, with redacted parameters logged separately.
    Structured,
}
