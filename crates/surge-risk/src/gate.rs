//! The pre-trade gate.

use crate::config::GateConfig;
use crate::cooldown::CooldownRegistry;
use crate::reject::RejectReason;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use surge_core::{Direction, Price, Symbol, Tier};
use surge_detector::Signal;
use surge_feed::RegimeSource;
use surge_position::initial_stop;
use tracing::{debug, info};

/// A sized, approved order: everything the executor needs to enter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradePlan {
    pub symbol: Symbol,
    pub direction: Direction,
    pub margin: Decimal,
    pub leverage: u32,
    pub entry_price: Price,
    pub stop_price: Price,
}

/// Runs every check between a raw signal and an order.
///
/// Check order is fixed: duplicate, cooldown, regime, capacity, price.
/// The duplicate and cooldown checks always apply; `bypass_checks` on
/// the signal skips only regime and capacity. The one exception is a
/// Tier 1 signal caught inside the peak time-of-day window, which also
/// overrides its own cooldown.
pub struct TradeGate {
    config: GateConfig,
    regime: Arc<dyn RegimeSource>,
    cooldowns: CooldownRegistry,
}

impl TradeGate {
    pub fn new(config: GateConfig, regime: Arc<dyn RegimeSource>) -> Self {
        Self {
            config,
            regime,
            cooldowns: CooldownRegistry::new(),
        }
    }

    pub fn cooldowns(&self) -> &CooldownRegistry {
        &self.cooldowns
    }

    /// Evaluate a signal. On approval the symbol's cooldown is armed
    /// with the signal tier's duration and a sized [`TradePlan`] comes
    /// back; the caller places the order and tracks the fill.
    pub fn evaluate(
        &self,
        signal: &Signal,
        entry_price: Option<Price>,
        open_positions: usize,
        has_position: bool,
        now_ms: u64,
    ) -> Result<TradePlan, RejectReason> {
        if has_position {
            debug!(symbol = %signal.symbol, "rejected: duplicate position");
            return Err(RejectReason::DuplicatePosition);
        }

        let peak_tier1 = signal.is_peak_window && signal.tier == Tier::Instant;
        if !peak_tier1 && self.cooldowns.is_active(&signal.symbol, now_ms) {
            debug!(symbol = %signal.symbol, "rejected: cooldown active");
            return Err(RejectReason::CooldownActive);
        }

        if !signal.bypass_checks {
            let regime = self.regime.regime();
            if !regime.allows_new_entries() {
                // Strong signals trade through a blocked regime.
                if !signal.is_regime_agnostic() {
                    debug!(symbol = %signal.symbol, ?regime, "rejected: regime blocks entries");
                    return Err(RejectReason::RegimeBlocked);
                }
            } else {
                let allowed = match signal.direction {
                    Direction::Long => regime.allows_long(),
                    Direction::Short => regime.allows_short(),
                };
                if !allowed {
                    debug!(symbol = %signal.symbol, ?regime, %signal.direction, "rejected: direction blocked");
                    return Err(RejectReason::DirectionBlocked);
                }
            }

            if open_positions >= self.config.max_positions {
                debug!(symbol = %signal.symbol, open_positions, "rejected: at capacity");
                return Err(RejectReason::NoCapacity);
            }
        }

        let entry_price = entry_price.ok_or(RejectReason::PriceUnavailable)?;
        if !entry_price.is_positive() {
            return Err(RejectReason::PriceUnavailable);
        }

        let leverage = self.config.leverage_for_score(signal.score);
        let stop_price = initial_stop(entry_price, signal.direction, leverage, &self.config.stop);
        self.cooldowns
            .arm(&signal.symbol, signal.cooldown_secs, now_ms);

        info!(
            symbol = %signal.symbol,
            %signal.direction,
            tier = %signal.tier,
            score = signal.score,
            leverage,
            entry = %entry_price,
            stop = %stop_price,
            "signal approved"
        );
        Ok(TradePlan {
            symbol: signal.symbol.clone(),
            direction: signal.direction,
            margin: self.config.margin_per_trade,
            leverage,
            entry_price,
            stop_price,
        })
    }
}
