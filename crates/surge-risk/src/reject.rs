//! Gate rejection reasons.

use thiserror::Error;

/// Why the gate turned a signal away. Rejections are expected flow, not
/// faults; they are logged at debug and counted, never bubbled as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("regime blocks new entries")]
    RegimeBlocked,

    #[error("regime blocks this direction")]
    DirectionBlocked,

    #[error("max concurrent positions reached")]
    NoCapacity,

    #[error("position already open for symbol")]
    DuplicatePosition,

    #[error("symbol is in cooldown")]
    CooldownActive,

    #[error("no current price for symbol")]
    PriceUnavailable,
}
