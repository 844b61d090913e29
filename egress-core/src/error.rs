use thiserror::Error;

/// Unified error type for Egress.
#[derive(Error, Debug)]
pub enum EgressError {
    /// `stop` / `fail` was invoked without the context returned by `start`.
    #[error("Missing call context: stop/fail invoked without a matching start")]
    MissingContext,

    /// The context handed back was not produced by this logger's `start`.
    #[error("Invalid call context: not produced by this logger")]
    InvalidContext,

    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Body read error: {0}")]
    Body(String),

    #[error("Enricher '{enricher}' failed: {reason}")]
    Enrichment { enricher: String, reason: String },
}

impl EgressError {
    /// Transport-integration bugs: a hook was called out of sequence.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, EgressError::MissingContext | EgressError::InvalidContext)
    }

    /// Errors that must fail loudly instead of degrading to best-effort logging.
    pub fn is_fatal(&self) -> bool {
        self.is_usage_error() || matches!(self, EgressError::Config(_))
    }

    pub fn config(msg: impl Into<String>) -> Self {
        EgressError::Config(msg.into())
    }
}
