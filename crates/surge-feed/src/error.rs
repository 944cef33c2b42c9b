//! Error types for order execution.

use surge_core::Symbol;
use thiserror::Error;

/// Errors surfaced by the order execution collaborator.
///
/// The decision core never retries these; it propagates them to the
/// caller that requested the action.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Order rejected for {symbol}: {reason}")]
    Rejected { symbol: Symbol, reason: String },

    #[error("Exchange unavailable: {0}")]
    Unavailable(String),

    #[error("No open position for {0}")]
    NoPosition(Symbol),
}

/// Result type alias for executor operations.
pub type ExecutorResult<T> = Result<T, ExecutorError>;
