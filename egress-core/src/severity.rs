use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Status codes treated as failed calls.
pub const HTTP_ERROR_STATUS: RangeInclusive<u16> = 400..=599;

/// Level assigned to an emitted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Information,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Information => "information",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a completed call with the given status code.
#[inline]
pub fn classify_status(status: u16) -> Severity {
    if HTTP_ERROR_STATUS.contains(&status) {
        Severity::Error
    } else {
        Severity::Information
    }
}

/// Severity of a finished call. A transport failure is always an error;
/// a completion without a status code cannot be judged healthy either.
#[inline]
pub fn classify(status: Option<u16>, transport_failed: bool) -> Severity {
    match (transport_failed, status) {
        (true, _) => Severity::Error,
        (false, Some(status)) => classify_status(status),
        (false, None) => Severity::Error,
    }
}
