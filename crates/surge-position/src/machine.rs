//! Exit state machine.

use crate::config::{ExitConfig, TpEffect};
use crate::state::PositionState;
use crate::stop::initial_stop;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use surge_core::{Direction, Price, Symbol};
use surge_feed::MarketData;
use tracing::{info, warn};

/// Why a position (or part of one) is being closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    VelocityReversal,
    InstantPump,
    FundingExit,
    TakeProfit,
    TrailingStop,
    MaxHoldTime,
    RegimeChange,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::StopLoss => "stop_loss",
            Self::VelocityReversal => "velocity_reversal",
            Self::InstantPump => "instant_pump",
            Self::FundingExit => "funding_exit",
            Self::TakeProfit => "take_profit",
            Self::TrailingStop => "trailing_stop",
            Self::MaxHoldTime => "max_hold_time",
            Self::RegimeChange => "regime_change",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitKind {
    CloseAll,
    ClosePartial,
}

/// A requested close. The caller routes it to the order executor and
/// then reports the outcome back via [`ExitStateMachine::apply_close`]
/// or [`ExitStateMachine::remove`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitAction {
    pub symbol: Symbol,
    pub kind: ExitKind,
    pub reason: ExitReason,
    /// Percent of the original size to close (100 = everything left).
    pub close_pct: Decimal,
    /// Diagnostic values behind the decision.
    pub details: BTreeMap<String, Decimal>,
}

/// Tracks open positions and evaluates the exit cascade on every tick.
///
/// Priority order is fixed; the first matching condition wins and halts
/// evaluation for that tick. The regime-flip flush is separate and not
/// priority-ordered.
pub struct ExitStateMachine {
    config: ExitConfig,
    feed: Arc<dyn MarketData>,
    positions: HashMap<Symbol, PositionState>,
}

impl ExitStateMachine {
    pub fn new(config: ExitConfig, feed: Arc<dyn MarketData>) -> Self {
        Self {
            config,
            feed,
            positions: HashMap::new(),
        }
    }

    /// Start tracking a filled entry. Replaces any stale entry for the
    /// symbol (the gate's duplicate check prevents this in practice).
    pub fn track(
        &mut self,
        symbol: Symbol,
        direction: Direction,
        entry_price: Price,
        margin: Decimal,
        leverage: u32,
        now_ms: u64,
    ) {
        let stop = initial_stop(entry_price, direction, leverage, &self.config.stop);
        info!(symbol = %symbol, %direction, entry = %entry_price, stop = %stop, leverage, "position tracked");
        let state = PositionState::new(
            symbol.clone(),
            direction,
            entry_price,
            margin,
            leverage,
            stop,
            now_ms,
        );
        self.positions.insert(symbol, state);
    }

    /// Evaluate the exit cascade for one position at one price.
    ///
    /// `velocity_1m` is the recent 1-minute velocity for the instrument;
    /// `None` skips the reversal check.
    pub async fn on_tick(
        &mut self,
        symbol: &Symbol,
        current: Price,
        velocity_1m: Option<Decimal>,
        now_ms: u64,
    ) -> Option<ExitAction> {
        let pos = self.positions.get_mut(symbol)?;

        if !pos.entry_price.is_positive() {
            warn!(symbol = %symbol, entry = %pos.entry_price, "invalid entry price, skipping tick");
            return None;
        }

        pos.observe(current);
        let profit = pos.profit_pct(current)?;
        if profit > pos.peak_profit_pct {
            pos.peak_profit_pct = profit;
        }

        // Early trailing activation, before the cascade. Snaps the stop
        // to breakeven.
        if !pos.trailing_active && profit >= self.config.trailing.activation_profit_pct {
            pos.trailing_active = true;
            pos.stop_price = pos.entry_price;
            info!(symbol = %symbol, profit = %profit, "trailing activated early, stop to breakeven");
        }

        // 1. Hard stop.
        let stop_hit = match pos.direction {
            Direction::Long => current <= pos.stop_price,
            Direction::Short => current >= pos.stop_price,
        };
        if stop_hit {
            let mut details = BTreeMap::new();
            details.insert("price".to_string(), current.inner());
            details.insert("stop_price".to_string(), pos.stop_price.inner());
            details.insert("profit_pct".to_string(), profit);
            warn!(symbol = %symbol, price = %current, stop = %pos.stop_price, "stop loss hit");
            return Some(ExitAction {
                symbol: symbol.clone(),
                kind: ExitKind::CloseAll,
                reason: ExitReason::StopLoss,
                close_pct: dec!(100),
                details,
            });
        }

        // 2. Velocity reversal, only after the position has seen profit.
        if pos.peak_profit_pct > Decimal::ZERO {
            if let Some(velocity) = velocity_1m {
                // Velocity against the favorable direction.
                let reversal = velocity * Decimal::from(pos.direction.sign());
                if reversal <= self.config.velocity.severe_velocity_1m {
                    let mut details = BTreeMap::new();
                    details.insert("velocity_1m".to_string(), velocity);
                    details.insert("peak_profit_pct".to_string(), pos.peak_profit_pct);
                    details.insert("profit_pct".to_string(), profit);
                    warn!(symbol = %symbol, velocity = %velocity, "severe velocity reversal, closing all");
                    return Some(ExitAction {
                        symbol: symbol.clone(),
                        kind: ExitKind::CloseAll,
                        reason: ExitReason::VelocityReversal,
                        close_pct: pos.remaining_pct,
                        details,
                    });
                }
                if reversal <= self.config.velocity.partial_velocity_1m
                    && !pos.velocity_partial_done
                {
                    pos.velocity_partial_done = true;
                    let mut details = BTreeMap::new();
                    details.insert("velocity_1m".to_string(), velocity);
                    details.insert("peak_profit_pct".to_string(), pos.peak_profit_pct);
                    details.insert("profit_pct".to_string(), profit);
                    warn!(symbol = %symbol, velocity = %velocity, "velocity reversal, partial close");
                    return Some(ExitAction {
                        symbol: symbol.clone(),
                        kind: ExitKind::ClosePartial,
                        reason: ExitReason::VelocityReversal,
                        close_pct: self.config.velocity.partial_close_pct,
                        details,
                    });
                }
            }
        }

        // 3. Instant pump lock-in, once, inside the window from entry.
        if !pos.instant_pump_done
            && pos.held_secs(now_ms) <= self.config.instant_pump.window_secs
            && profit >= self.config.instant_pump.profit_pct
        {
            pos.instant_pump_done = true;
            let mut details = BTreeMap::new();
            details.insert("profit_pct".to_string(), profit);
            details.insert(
                "held_secs".to_string(),
                Decimal::from(pos.held_secs(now_ms)),
            );
            warn!(symbol = %symbol, profit = %profit, "instant pump, locking in partial");
            return Some(ExitAction {
                symbol: symbol.clone(),
                kind: ExitKind::ClosePartial,
                reason: ExitReason::InstantPump,
                close_pct: self.config.instant_pump.close_pct,
                details,
            });
        }

        // 4. Funding.
        if let Some(rate) = self.feed.funding_rate(symbol).await {
            if rate.abs() >= self.config.funding.max_rate {
                if profit < self.config.funding.full_close_below_profit_pct {
                    let mut details = BTreeMap::new();
                    details.insert("funding_rate".to_string(), rate);
                    details.insert("profit_pct".to_string(), profit);
                    warn!(symbol = %symbol, rate = %rate, profit = %profit, "funding exit, closing all");
                    return Some(ExitAction {
                        symbol: symbol.clone(),
                        kind: ExitKind::CloseAll,
                        reason: ExitReason::FundingExit,
                        close_pct: dec!(100),
                        details,
                    });
                }
                if profit > self.config.funding.partial_above_profit_pct {
                    let mut details = BTreeMap::new();
                    details.insert("funding_rate".to_string(), rate);
                    details.insert("profit_pct".to_string(), profit);
                    info!(symbol = %symbol, rate = %rate, profit = %profit, "funding exit, partial");
                    return Some(ExitAction {
                        symbol: symbol.clone(),
                        kind: ExitKind::ClosePartial,
                        reason: ExitReason::FundingExit,
                        close_pct: self.config.funding.partial_close_pct,
                        details,
                    });
                }
            }
        }

        // 5. Staged take-profit, each level at most once.
        for (idx, level) in self.config.take_profit.iter().enumerate() {
            if pos.tp_levels_consumed.contains(&idx) {
                continue;
            }
            if profit < level.profit_pct {
                continue;
            }
            pos.tp_levels_consumed.insert(idx);
            match level.effect {
                TpEffect::MoveStopBreakeven => {
                    pos.stop_price = pos.entry_price;
                    info!(symbol = %symbol, "tp level hit, stop to breakeven");
                }
                TpEffect::ActivateTrailing => {
                    pos.trailing_active = true;
                    info!(symbol = %symbol, "tp level hit, trailing activated");
                }
                TpEffect::LetRide => {
                    info!(symbol = %symbol, "tp level hit, letting the rest ride");
                }
            }
            let mut details = BTreeMap::new();
            details.insert("level_profit_pct".to_string(), level.profit_pct);
            details.insert("profit_pct".to_string(), profit);
            return Some(ExitAction {
                symbol: symbol.clone(),
                kind: ExitKind::ClosePartial,
                reason: ExitReason::TakeProfit,
                close_pct: level.close_pct,
                details,
            });
        }

        // 6. Tiered trailing stop. Distance chosen by peak profit so it
        // only ever widens; the trigger is computed from the favorable
        // extreme, never the current price.
        if pos.trailing_active {
            let distance = self
                .config
                .trailing
                .bands
                .iter()
                .rev()
                .find(|band| pos.peak_profit_pct >= band.min_peak_profit_pct)
                .map(|band| band.distance_pct)
                .unwrap_or_else(|| {
                    self.config
                        .trailing
                        .bands
                        .first()
                        .map(|b| b.distance_pct)
                        .unwrap_or(dec!(2))
                });
            let ratio = distance / dec!(100);
            let (extreme, triggered) = match pos.direction {
                Direction::Long => {
                    let trail = pos.highest_price.inner() * (Decimal::ONE - ratio);
                    (pos.highest_price, current.inner() <= trail)
                }
                Direction::Short => {
                    let trail = pos.lowest_price.inner() * (Decimal::ONE + ratio);
                    (pos.lowest_price, current.inner() >= trail)
                }
            };
            if triggered {
                let mut details = BTreeMap::new();
                details.insert("extreme".to_string(), extreme.inner());
                details.insert("distance_pct".to_string(), distance);
                details.insert("price".to_string(), current.inner());
                details.insert("profit_pct".to_string(), profit);
                info!(symbol = %symbol, extreme = %extreme, distance = %distance, "trailing stop hit");
                return Some(ExitAction {
                    symbol: symbol.clone(),
                    kind: ExitKind::CloseAll,
                    reason: ExitReason::TrailingStop,
                    close_pct: pos.remaining_pct,
                    details,
                });
            }
        }

        // 7. Max hold.
        if pos.held_secs(now_ms) >= self.config.max_hold_hours * 3600 {
            let mut details = BTreeMap::new();
            details.insert(
                "held_hours".to_string(),
                Decimal::from(pos.held_secs(now_ms) / 3600),
            );
            details.insert("profit_pct".to_string(), profit);
            warn!(symbol = %symbol, "max hold time exceeded, closing");
            return Some(ExitAction {
                symbol: symbol.clone(),
                kind: ExitKind::CloseAll,
                reason: ExitReason::MaxHoldTime,
                close_pct: dec!(100),
                details,
            });
        }

        None
    }

    /// Regime flipped into CHOPPY: one full close per open position,
    /// independent of the per-tick cascade.
    pub fn on_regime_choppy(&self) -> Vec<ExitAction> {
        let actions: Vec<ExitAction> = self
            .positions
            .values()
            .map(|pos| ExitAction {
                symbol: pos.symbol.clone(),
                kind: ExitKind::CloseAll,
                reason: ExitReason::RegimeChange,
                close_pct: dec!(100),
                details: BTreeMap::new(),
            })
            .collect();
        if !actions.is_empty() {
            warn!(count = actions.len(), "regime CHOPPY, flushing all positions");
        }
        actions
    }

    /// Report a confirmed (partial) close. Removes the position once
    /// nothing remains.
    pub fn apply_close(&mut self, symbol: &Symbol, closed_pct: Decimal) {
        if let Some(pos) = self.positions.get_mut(symbol) {
            pos.remaining_pct -= closed_pct;
            if pos.remaining_pct <= Decimal::ZERO {
                self.positions.remove(symbol);
                info!(symbol = %symbol, "position fully closed");
            }
        }
    }

    pub fn remove(&mut self, symbol: &Symbol) {
        self.positions.remove(symbol);
    }

    pub fn state(&self, symbol: &Symbol) -> Option<&PositionState> {
        self.positions.get(symbol)
    }

    pub fn positions(&self) -> impl Iterator<Item = &PositionState> {
        self.positions.values()
    }

    pub fn open_count(&self) -> usize {
        self.positions.len()
    }

    pub fn has_position(&self, symbol: &Symbol) -> bool {
        self.positions.contains_key(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surge_feed::MockMarketData;

    const T0: u64 = 1_700_000_000_000;

    fn quiet_feed() -> MockMarketData {
        let mut feed = MockMarketData::new();
        feed.expect_funding_rate().returning(|_| None);
        feed
    }

    fn machine_with(feed: MockMarketData) -> ExitStateMachine {
        ExitStateMachine::new(ExitConfig::default(), Arc::new(feed))
    }

    fn sym() -> Symbol {
        Symbol::from("TESTUSDT")
    }

    fn track_long(m: &mut ExitStateMachine) {
        m.track(sym(), Direction::Long, Price::new(dec!(100)), dec!(10), 10, T0);
    }

    #[tokio::test]
    async fn test_stop_loss_hit() {
        let mut m = machine_with(quiet_feed());
        track_long(&mut m);
        assert_eq!(m.state(&sym()).unwrap().stop_price.inner(), dec!(96.5));

        let action = m
            .on_tick(&sym(), Price::new(dec!(96.4)), None, T0 + 1000)
            .await
            .unwrap();
        assert_eq!(action.reason, ExitReason::StopLoss);
        assert_eq!(action.kind, ExitKind::CloseAll);
        assert_eq!(action.close_pct, dec!(100));
        assert_eq!(action.details["profit_pct"], dec!(-3.6));
    }

    #[tokio::test]
    async fn test_velocity_partial_fires_once() {
        let mut m = machine_with(quiet_feed());
        track_long(&mut m);

        // Build some profit first so the reversal check is armed; +1%
        // stays below trailing activation and every close threshold.
        assert!(m
            .on_tick(&sym(), Price::new(dec!(101)), Some(dec!(0.5)), T0 + 1000)
            .await
            .is_none());

        let first = m
            .on_tick(&sym(), Price::new(dec!(100.5)), Some(dec!(-2.2)), T0 + 2000)
            .await
            .unwrap();
        assert_eq!(first.reason, ExitReason::VelocityReversal);
        assert_eq!(first.kind, ExitKind::ClosePartial);
        assert_eq!(first.close_pct, dec!(50));

        // Identical breach on the next tick must not fire again.
        assert!(m
            .on_tick(&sym(), Price::new(dec!(100.5)), Some(dec!(-2.2)), T0 + 3000)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_severe_velocity_closes_all() {
        let mut m = machine_with(quiet_feed());
        track_long(&mut m);
        assert!(m
            .on_tick(&sym(), Price::new(dec!(101)), Some(dec!(0.5)), T0 + 1000)
            .await
            .is_none());

        let action = m
            .on_tick(&sym(), Price::new(dec!(100.5)), Some(dec!(-3.5)), T0 + 2000)
            .await
            .unwrap();
        assert_eq!(action.reason, ExitReason::VelocityReversal);
        assert_eq!(action.kind, ExitKind::CloseAll);
    }

    #[tokio::test]
    async fn test_velocity_reversal_needs_prior_profit() {
        let mut m = machine_with(quiet_feed());
        track_long(&mut m);

        // Straight down from entry: the stop protects, not the
        // reversal check. -3.5% velocity at 98 (above the 96.5 stop).
        assert!(m
            .on_tick(&sym(), Price::new(dec!(98)), Some(dec!(-3.5)), T0 + 1000)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_instant_pump_locks_in_once_inside_window() {
        let mut m = machine_with(quiet_feed());
        track_long(&mut m);

        // +6% three minutes in. TP level 5% would also match but the
        // pump lock-in has priority.
        let action = m
            .on_tick(&sym(), Price::new(dec!(106)), None, T0 + 180_000)
            .await
            .unwrap();
        assert_eq!(action.reason, ExitReason::InstantPump);
        assert_eq!(action.close_pct, dec!(50));

        // Second tick falls through to the TP ladder instead.
        let action = m
            .on_tick(&sym(), Price::new(dec!(106)), None, T0 + 200_000)
            .await
            .unwrap();
        assert_eq!(action.reason, ExitReason::TakeProfit);
    }

    #[tokio::test]
    async fn test_instant_pump_skipped_outside_window() {
        let mut m = machine_with(quiet_feed());
        track_long(&mut m);

        // Same +6% but 20 minutes in: the TP ladder handles it.
        let action = m
            .on_tick(&sym(), Price::new(dec!(106)), None, T0 + 1_200_000)
            .await
            .unwrap();
        assert_eq!(action.reason, ExitReason::TakeProfit);
    }

    #[tokio::test]
    async fn test_funding_exit_branches() {
        let mut feed = MockMarketData::new();
        feed.expect_funding_rate().returning(|_| Some(dec!(0.002)));
        let mut m = machine_with(feed);
        track_long(&mut m);

        // Barely above entry: profit below the low cutoff, close all.
        let action = m
            .on_tick(&sym(), Price::new(dec!(100.5)), None, T0 + 1000)
            .await
            .unwrap();
        assert_eq!(action.reason, ExitReason::FundingExit);
        assert_eq!(action.kind, ExitKind::CloseAll);
    }

    #[tokio::test]
    async fn test_funding_partial_when_comfortably_profitable() {
        let mut feed = MockMarketData::new();
        feed.expect_funding_rate().returning(|_| Some(dec!(-0.0015)));
        let mut m = machine_with(feed);
        track_long(&mut m);

        // Timestamps past the pump window. 4% sits between the funding
        // cutoffs so nothing fires; at 6% funding wins over TP since it
        // checks earlier in the cascade.
        assert!(m
            .on_tick(&sym(), Price::new(dec!(104)), None, T0 + 1_200_000)
            .await
            .is_none());

        let action = m
            .on_tick(&sym(), Price::new(dec!(106)), None, T0 + 1_260_000)
            .await
            .unwrap();
        assert_eq!(action.reason, ExitReason::FundingExit);
        assert_eq!(action.kind, ExitKind::ClosePartial);
        assert_eq!(action.close_pct, dec!(50));
    }

    #[tokio::test]
    async fn test_tp_level_consumed_once() {
        let mut m = machine_with(quiet_feed());
        track_long(&mut m);

        // +5% exactly, outside the pump window.
        let action = m
            .on_tick(&sym(), Price::new(dec!(105)), None, T0 + 1_200_000)
            .await
            .unwrap();
        assert_eq!(action.reason, ExitReason::TakeProfit);
        assert_eq!(action.close_pct, dec!(30));
        // Side effect: breakeven stop.
        assert_eq!(m.state(&sym()).unwrap().stop_price.inner(), dec!(100));
        m.apply_close(&sym(), action.close_pct);

        // Oscillate below and back above 5%: the level must not
        // re-trigger. 4.5% profit with trailing active (activated at 2%)
        // does not retrace 3% from the 105 peak either.
        assert!(m
            .on_tick(&sym(), Price::new(dec!(104.5)), None, T0 + 1_260_000)
            .await
            .is_none());
        assert!(m
            .on_tick(&sym(), Price::new(dec!(105.2)), None, T0 + 1_320_000)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_trailing_trigger_uses_extreme_not_current() {
        let mut m = machine_with(quiet_feed());
        track_long(&mut m);

        // Walk to +8-ish% consuming the 5% TP level on the way.
        let action = m
            .on_tick(&sym(), Price::new(dec!(108)), None, T0 + 1_200_000)
            .await
            .unwrap();
        assert_eq!(action.reason, ExitReason::TakeProfit);
        m.apply_close(&sym(), action.close_pct);

        // Peak profit 8% selects the 3% band: trail = 108 * 0.97 =
        // 104.76. A dip to 105 holds, 104.7 exits.
        assert!(m
            .on_tick(&sym(), Price::new(dec!(105)), None, T0 + 1_260_000)
            .await
            .is_none());
        let action = m
            .on_tick(&sym(), Price::new(dec!(104.7)), None, T0 + 1_320_000)
            .await
            .unwrap();
        assert_eq!(action.reason, ExitReason::TrailingStop);
        assert_eq!(action.kind, ExitKind::CloseAll);
        assert_eq!(action.details["extreme"], dec!(108));
        assert_eq!(action.details["distance_pct"], dec!(3));
    }

    #[tokio::test]
    async fn test_trailing_distance_widens_with_peak() {
        let mut m = machine_with(quiet_feed());
        track_long(&mut m);

        // March through the TP ladder to +55%. The last level's fill is
        // left unconfirmed so a runner remains to trail.
        for (price, ts) in [
            (dec!(106), T0 + 1_200_000),
            (dec!(111), T0 + 1_260_000),
            (dec!(122), T0 + 1_320_000),
        ] {
            let action = m.on_tick(&sym(), Price::new(price), None, ts).await.unwrap();
            assert_eq!(action.reason, ExitReason::TakeProfit);
            m.apply_close(&sym(), action.close_pct);
        }
        let action = m
            .on_tick(&sym(), Price::new(dec!(155)), None, T0 + 1_380_000)
            .await
            .unwrap();
        assert_eq!(action.reason, ExitReason::TakeProfit);

        // Peak 55% selects the widest 5% band: trail = 155 * 0.95 =
        // 147.25. A pullback to 148 survives where the tight band
        // would have closed.
        assert!(m
            .on_tick(&sym(), Price::new(dec!(148)), None, T0 + 1_440_000)
            .await
            .is_none());
        let action = m
            .on_tick(&sym(), Price::new(dec!(147)), None, T0 + 1_500_000)
            .await
            .unwrap();
        assert_eq!(action.reason, ExitReason::TrailingStop);
        assert_eq!(action.details["distance_pct"], dec!(5));
    }

    #[tokio::test]
    async fn test_max_hold_timeout() {
        let mut m = machine_with(quiet_feed());
        track_long(&mut m);

        let week_later = T0 + 168 * 3600 * 1000;
        let action = m
            .on_tick(&sym(), Price::new(dec!(100.2)), None, week_later)
            .await
            .unwrap();
        assert_eq!(action.reason, ExitReason::MaxHoldTime);
        assert_eq!(action.close_pct, dec!(100));
    }

    #[tokio::test]
    async fn test_regime_choppy_flushes_every_position() {
        let mut m = machine_with(quiet_feed());
        for name in ["AUSDT", "BUSDT", "CUSDT"] {
            m.track(
                Symbol::from(name),
                Direction::Long,
                Price::new(dec!(100)),
                dec!(10),
                10,
                T0,
            );
        }

        let actions = m.on_regime_choppy();
        assert_eq!(actions.len(), 3);
        assert!(actions
            .iter()
            .all(|a| a.reason == ExitReason::RegimeChange && a.close_pct == dec!(100)));
    }

    #[tokio::test]
    async fn test_idempotent_quiet_tick() {
        let mut m = machine_with(quiet_feed());
        track_long(&mut m);

        for _ in 0..2 {
            assert!(m
                .on_tick(&sym(), Price::new(dec!(100.5)), Some(dec!(0.1)), T0 + 1000)
                .await
                .is_none());
        }
    }

    #[tokio::test]
    async fn test_apply_close_removes_at_zero() {
        let mut m = machine_with(quiet_feed());
        track_long(&mut m);

        m.apply_close(&sym(), dec!(50));
        assert_eq!(m.state(&sym()).unwrap().remaining_pct, dec!(50));
        m.apply_close(&sym(), dec!(50));
        assert!(m.state(&sym()).is_none());
        assert_eq!(m.open_count(), 0);
    }

    #[tokio::test]
    async fn test_short_stop_direction() {
        let mut m = machine_with(quiet_feed());
        m.track(sym(), Direction::Short, Price::new(dec!(100)), dec!(10), 10, T0);
        assert_eq!(m.state(&sym()).unwrap().stop_price.inner(), dec!(103.5));

        let action = m
            .on_tick(&sym(), Price::new(dec!(103.6)), None, T0 + 1000)
            .await
            .unwrap();
        assert_eq!(action.reason, ExitReason::StopLoss);
    }
}
