// Typed failures for the report engines.
//
// Only genuinely exceptional conditions live here. "Nothing matched"
// outcomes are successful responses with an explanatory message (see
// report.rs), never errors - callers branch on the response type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed caller input: non-positive id or limit.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Catalog state prevents the request (empty catalog, zero configured
    /// copies). Not a transient condition.
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    /// Detected ledger/catalog integrity violation.
    #[error("internal: {0}")]
    Internal(String),

    /// A ledger read failed. Propagated verbatim, never retried.
    #[error("ledger read failed: {0}")]
    Ledger(#[from] anyhow::Error),
}

impl EngineError {
    /// Stable taxonomy name, mirroring gRPC status code vocabulary.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InvalidArgument(_) => "InvalidArgument",
            EngineError::NotFound(_) => "NotFound",
            EngineError::FailedPrecondition(_) => "FailedPrecondition",
            EngineError::Internal(_) => "Internal",
            EngineError::Ledger(_) => "Internal",
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
