use thiserror::Error;

/// Errors surfaced by the detection engine and its CSV ingestion boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Pre-core validation failure. `line` is the 1-based CSV line of the
    /// offending record (line 1 is the header).
    #[error("invalid record at CSV line {line}: {reason}")]
    InputRejected { line: usize, reason: String },

    /// A detector produced output that fails aggregation-time validation.
    /// This is a programming fault and aborts the invocation.
    #[error("detector invariant violated: {0}")]
    InvariantViolation(String),
}

impl EngineError {
    pub(crate) fn rejected(line: usize, reason: impl Into<String>) -> Self {
        Self::InputRejected { line, reason: reason.into() }
    }
}
