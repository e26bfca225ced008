//! Error taxonomy
//!
//! `EngineError` is what submitters see; `BookError` is internal to the
//! matching path, where an invariant violation is fatal and must stop
//! the engine rather than corrupt a response.

use crate::ids::OrderId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors surfaced to order submitters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("risk check '{check}' denied: {reason}")]
    RiskDenied {
        check: &'static str,
        reason: String,
        suggested_limit: Option<Decimal>,
    },

    #[error("trading halted: {reason}")]
    Halted { reason: String },

    #[error("ingress queue full")]
    QueueFull,

    #[error("engine is not running")]
    EngineNotRunning,

    #[error("duplicate order id: {0}")]
    DuplicateOrderId(OrderId),

    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Whether the submitter may retry the same request unchanged.
    pub fn is_retriable(&self) -> bool {
        matches!(self, EngineError::QueueFull)
    }
}

/// Book-internal failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookError {
    #[error("duplicate order id: {0}")]
    DuplicateOrderId(OrderId),

    /// Index and price levels disagree. Fatal: the engine must stop.
    #[error("book invariant violated: {detail}")]
    InvariantViolation { detail: String },
}

impl From<BookError> for EngineError {
    fn from(err: BookError) -> Self {
        match err {
            BookError::DuplicateOrderId(id) => EngineError::DuplicateOrderId(id),
            BookError::InvariantViolation { detail } => EngineError::Internal(detail),
        }
    }
}
