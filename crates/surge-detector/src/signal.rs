//! Entry signal type.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use surge_core::{Direction, Symbol, Tier};

/// A tiered entry signal.
///
/// Created fresh each scan cycle, never mutated, consumed immediately by
/// the trade gate. Never persisted: losing a signal on crash is fine, the
/// next scan regenerates it.
///
/// `contributing` carries diagnostic indicator values only; control flow
/// never reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: Symbol,
    pub direction: Direction,
    pub tier: Tier,
    /// Score out of 6 (legacy path counts true checks; velocity tiers
    /// assign fixed scores).
    pub score: u8,
    /// Confidence in `[0, 1]`.
    pub confidence: Decimal,
    /// Tier 1/2 and mega signals skip the regime and capacity gates.
    pub bypass_checks: bool,
    /// Re-entry suppression for this instrument, seconds.
    pub cooldown_secs: u64,
    /// Detected during a configured peak time-of-day window.
    pub is_peak_window: bool,
    /// Indicator values that contributed to the decision (diagnostics).
    pub contributing: BTreeMap<String, Decimal>,
    /// Detection timestamp, Unix milliseconds.
    pub detected_at_ms: u64,
}

impl Signal {
    /// Whether this signal may relax the CHOPPY-regime entry block
    /// (high legacy score or an explicit bypass tier).
    pub fn is_regime_agnostic(&self) -> bool {
        self.bypass_checks || self.score >= 4
    }
}
