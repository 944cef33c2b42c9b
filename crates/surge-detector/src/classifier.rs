//! Tier cascade evaluation.

use crate::config::DetectorConfig;
use crate::moondrop::MoondropIndicators;
use crate::oi_tracker::OiTracker;
use crate::signal::Signal;
use chrono::{DateTime, Timelike, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use std::sync::Arc;
use surge_core::{CandleInterval, Direction, Symbol, Tier};
use surge_feed::{MarketData, PriceWindow};
use tracing::{debug, info, warn};

/// 5m candles averaged for the volume baseline (one hour).
const VOLUME_BASELINE_CANDLES: usize = 12;
/// 5m candles fetched for the momentum stack (one hour plus current).
const MOMENTUM_CANDLES_5M: usize = 13;
/// 5m candles fetched for moondrop shape indicators.
const MOONDROP_CANDLES_5M: usize = 15;

/// Per-instrument signal classifier.
///
/// One instance per instrument, owned by that instrument's scan worker,
/// so the open-interest history needs no locking. `scan` emits at most
/// one signal per call; the first matching tier wins and later tiers
/// are not evaluated.
pub struct TierClassifier {
    symbol: Symbol,
    config: DetectorConfig,
    feed: Arc<dyn MarketData>,
    oi: OiTracker,
}

impl TierClassifier {
    pub fn new(symbol: Symbol, config: DetectorConfig, feed: Arc<dyn MarketData>) -> Self {
        Self {
            symbol,
            config,
            feed,
            oi: OiTracker::new(),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Scan long first, then short. The moondrop cascade runs before
    /// the generic short tiers.
    pub async fn scan(&mut self, window: &PriceWindow, now_ms: u64) -> Option<Signal> {
        if let Some(signal) = self.scan_direction(window, Direction::Long, now_ms).await {
            return Some(signal);
        }
        if let Some(signal) = self.scan_moondrop(window, now_ms).await {
            return Some(signal);
        }
        self.scan_direction(window, Direction::Short, now_ms).await
    }

    async fn scan_direction(
        &mut self,
        window: &PriceWindow,
        direction: Direction,
        now_ms: u64,
    ) -> Option<Signal> {
        let is_peak = self.is_peak_hour(now_ms);
        let vel_5m = window.velocity_pct(300, now_ms);
        let vel_1m = window.velocity_pct(60, now_ms);
        let sign = Decimal::from(direction.sign());

        // Tier 1: raw 5m velocity, no confirmation.
        let tier1 = self.adjusted(self.config.tiers.tier1_velocity_5m, is_peak);
        if let Some(v) = vel_5m {
            if v * sign >= tier1 {
                warn!(symbol = %self.symbol, %direction, velocity_5m = %v, threshold = %tier1, peak = is_peak, "tier 1 instant signal");
                let mut contributing = BTreeMap::new();
                contributing.insert("velocity_5m".to_string(), v);
                return Some(self.build(
                    direction,
                    Tier::Instant,
                    6,
                    Decimal::ONE,
                    true,
                    self.config.tiers.cooldown_tier1_secs,
                    is_peak,
                    contributing,
                    now_ms,
                ));
            }
        }

        // Tier 2: lower 5m velocity plus volume confirmation.
        let tier2 = self.adjusted(self.config.tiers.tier2_velocity_5m, is_peak);
        if vel_5m.is_some_and(|v| v * sign >= tier2) {
            if let Some(ratio) = self.volume_ratio().await {
                if ratio >= self.config.tiers.tier2_volume_spike {
                    let v = vel_5m.unwrap_or(Decimal::ZERO);
                    warn!(symbol = %self.symbol, %direction, velocity_5m = %v, volume_ratio = %ratio, peak = is_peak, "tier 2 fast signal");
                    let mut contributing = BTreeMap::new();
                    contributing.insert("velocity_5m".to_string(), v);
                    contributing.insert("volume_ratio".to_string(), ratio);
                    return Some(self.build(
                        direction,
                        Tier::Fast,
                        5,
                        dec!(0.9),
                        true,
                        self.config.tiers.cooldown_tier2_secs,
                        is_peak,
                        contributing,
                        now_ms,
                    ));
                }
            }
        }

        // Momentum stack: same-direction velocity across 1h/15m/5m.
        if let Some(signal) = self
            .check_momentum_stack(direction, vel_5m, is_peak, now_ms)
            .await
        {
            return Some(signal);
        }

        // Tier 3: 1m velocity plus a consecutive-candle run.
        let tier3 = self.adjusted(self.config.tiers.tier3_velocity_1m, is_peak);
        if vel_1m.is_some_and(|v| v * sign >= tier3) {
            let required = self.config.tiers.tier3_consecutive_candles;
            let run = self.consecutive_candles(direction, required).await;
            if run >= required {
                let v = vel_1m.unwrap_or(Decimal::ZERO);
                info!(symbol = %self.symbol, %direction, velocity_1m = %v, consecutive = run, peak = is_peak, "tier 3 micro signal");
                let mut contributing = BTreeMap::new();
                contributing.insert("velocity_1m".to_string(), v);
                contributing.insert("consecutive_candles".to_string(), Decimal::from(run as u64));
                return Some(self.build(
                    direction,
                    Tier::Micro,
                    4,
                    dec!(0.75),
                    false,
                    self.config.tiers.cooldown_tier3_secs,
                    is_peak,
                    contributing,
                    now_ms,
                ));
            }
        }

        // Mega-pump pre-check: huge 24h move still running.
        if let Some(change_24h) = self.feed.change_24h_pct(&self.symbol).await {
            let follow = self.config.legacy.mega_pump_followthrough_5m;
            if change_24h * sign >= self.config.legacy.mega_pump_24h
                && vel_5m.is_some_and(|v| v * sign > follow)
            {
                let v = vel_5m.unwrap_or(Decimal::ZERO);
                warn!(symbol = %self.symbol, %direction, change_24h = %change_24h, velocity_5m = %v, "mega-pump signal");
                let mut contributing = BTreeMap::new();
                contributing.insert("change_24h".to_string(), change_24h);
                contributing.insert("velocity_5m".to_string(), v);
                return Some(self.build(
                    direction,
                    Tier::Fast,
                    5,
                    dec!(0.8),
                    true,
                    self.config.tiers.cooldown_tier2_secs,
                    is_peak,
                    contributing,
                    now_ms,
                ));
            }
        }

        self.check_legacy(window, direction, vel_5m, vel_1m, is_peak, now_ms)
            .await
    }

    async fn check_momentum_stack(
        &self,
        direction: Direction,
        vel_5m: Option<Decimal>,
        is_peak: bool,
        now_ms: u64,
    ) -> Option<Signal> {
        let sign = Decimal::from(direction.sign());
        if !vel_5m.is_some_and(|v| v * sign >= self.config.momentum.velocity_5m) {
            return None;
        }
        let candles = self
            .feed
            .recent_candles(&self.symbol, CandleInterval::FiveMin, MOMENTUM_CANDLES_5M)
            .await?;
        if candles.len() < MOMENTUM_CANDLES_5M {
            return None;
        }
        let last = candles.last()?;
        let base_1h = &candles[candles.len() - 12];
        let base_15m = &candles[candles.len() - 3];
        let change_1h = last.close.pct_from(base_1h.open)?;
        let change_15m = last.close.pct_from(base_15m.open)?;
        if change_1h * sign < self.config.momentum.velocity_1h
            || change_15m * sign < self.config.momentum.velocity_15m
        {
            return None;
        }
        let v = vel_5m.unwrap_or(Decimal::ZERO);
        warn!(symbol = %self.symbol, %direction, change_1h = %change_1h, change_15m = %change_15m, velocity_5m = %v, "momentum stack signal");
        let mut contributing = BTreeMap::new();
        contributing.insert("momentum_stack".to_string(), Decimal::ONE);
        contributing.insert("change_1h".to_string(), change_1h);
        contributing.insert("change_15m".to_string(), change_15m);
        contributing.insert("velocity_5m".to_string(), v);
        Some(self.build(
            direction,
            Tier::Fast,
            5,
            dec!(0.85),
            true,
            self.config.tiers.cooldown_tier2_secs,
            is_peak,
            contributing,
            now_ms,
        ))
    }

    /// Six-check scoring with the mega velocity override.
    async fn check_legacy(
        &mut self,
        window: &PriceWindow,
        direction: Direction,
        vel_5m: Option<Decimal>,
        vel_1m: Option<Decimal>,
        is_peak: bool,
        now_ms: u64,
    ) -> Option<Signal> {
        let legacy = self.config.legacy.clone();
        let mut contributing = BTreeMap::new();

        let volume_ok = match self.volume_ratio().await {
            Some(ratio) => {
                contributing.insert("volume_ratio".to_string(), ratio);
                ratio >= legacy.volume_spike_5m
            }
            None => false,
        };

        let price_ok = self.check_price_acceleration(direction, vel_5m, vel_1m);
        if let Some(v) = vel_5m {
            contributing.insert("velocity_5m".to_string(), v);
        }

        let oi_ok = match self.check_oi_surge(now_ms).await {
            Some(change) => {
                contributing.insert("oi_change_15m".to_string(), change);
                change >= legacy.oi_surge_15m
            }
            None => false,
        };

        let funding_ok = self.check_funding(direction, &mut contributing).await;
        let breakout_ok = self.check_breakout(window, direction).await;
        let orderbook_ok = self.check_orderbook(direction, &mut contributing).await;

        let score = [
            volume_ok,
            price_ok,
            oi_ok,
            funding_ok,
            breakout_ok,
            orderbook_ok,
        ]
        .iter()
        .filter(|&&ok| ok)
        .count() as u8;

        let is_mega = vel_5m.is_some_and(|v| v.abs() >= legacy.mega_velocity_5m);
        let min_signals = if is_mega {
            legacy.mega_min_signals
        } else {
            legacy.min_signals
        };
        if score < min_signals {
            return None;
        }

        if is_mega {
            warn!(symbol = %self.symbol, %direction, score, "mega legacy signal");
        } else {
            info!(symbol = %self.symbol, %direction, score, "legacy signal");
        }
        Some(self.build(
            direction,
            Tier::Legacy,
            score,
            Decimal::from(score) / dec!(6),
            is_mega,
            self.config.tiers.cooldown_legacy_secs,
            is_peak,
            contributing,
            now_ms,
        ))
    }

    /// 5m velocity with a 1m confirmation, relaxed for strong moves: a
    /// very strong 5m move needs no confirmation at all, a strong one
    /// needs only a weak confirmation.
    fn check_price_acceleration(
        &self,
        direction: Direction,
        vel_5m: Option<Decimal>,
        vel_1m: Option<Decimal>,
    ) -> bool {
        let legacy = &self.config.legacy;
        let sign = Decimal::from(direction.sign());
        let (Some(v5), Some(v1)) = (vel_5m, vel_1m) else {
            return false;
        };
        let v5 = v5 * sign;
        let v1 = v1 * sign;
        if v5 >= legacy.strong_velocity_bypass_5m {
            return true;
        }
        if v5 >= legacy.strong_velocity_5m && v1 >= legacy.weak_confirm_1m {
            return true;
        }
        v5 >= legacy.price_velocity_5m && v1 >= legacy.price_velocity_1m
    }

    async fn check_oi_surge(&mut self, now_ms: u64) -> Option<Decimal> {
        let oi = self.feed.open_interest(&self.symbol).await?;
        self.oi.push(now_ms, oi);
        self.oi.surge_pct(now_ms)
    }

    async fn check_funding(
        &self,
        direction: Direction,
        contributing: &mut BTreeMap<String, Decimal>,
    ) -> bool {
        let legacy = &self.config.legacy;
        match (direction, self.feed.funding_rate(&self.symbol).await) {
            // Missing funding data never blocks a long.
            (Direction::Long, None) => true,
            (Direction::Long, Some(rate)) => {
                contributing.insert("funding_rate".to_string(), rate);
                rate >= legacy.funding_floor_for_long && rate <= legacy.funding_max_for_long
            }
            (Direction::Short, None) => false,
            (Direction::Short, Some(rate)) => {
                contributing.insert("funding_rate".to_string(), rate);
                rate >= legacy.funding_min_for_short
            }
        }
    }

    /// Price beyond the support/resistance band widened by an ATR
    /// multiple.
    async fn check_breakout(&self, window: &PriceWindow, direction: Direction) -> bool {
        let Some(price) = window.latest_price() else {
            return false;
        };
        let Some((support, resistance, atr)) = self.feed.breakout_band(&self.symbol).await else {
            return false;
        };
        let band = atr * self.config.legacy.atr_multiplier;
        match direction {
            Direction::Long => price.inner() > resistance.inner() + band,
            Direction::Short => price.inner() < support.inner() - band,
        }
    }

    async fn check_orderbook(
        &self,
        direction: Direction,
        contributing: &mut BTreeMap<String, Decimal>,
    ) -> bool {
        let Some(imbalance) = self.feed.orderbook_imbalance(&self.symbol).await else {
            return false;
        };
        let favorable = match direction {
            Direction::Long => imbalance,
            Direction::Short => Decimal::ONE - imbalance,
        };
        contributing.insert("orderbook_imbalance".to_string(), favorable);
        favorable >= self.config.legacy.imbalance_threshold
    }

    /// Short cascade driven by candle shape, checked before the generic
    /// short tiers.
    async fn scan_moondrop(&mut self, window: &PriceWindow, now_ms: u64) -> Option<Signal> {
        let md = &self.config.moondrop;
        let candles = self
            .feed
            .recent_candles(&self.symbol, CandleInterval::FiveMin, MOONDROP_CANDLES_5M)
            .await?;
        if candles.len() < 12 {
            return None;
        }
        let ind = MoondropIndicators::from_candles(&candles);
        let vel_5m = window.velocity_pct(300, now_ms).unwrap_or(Decimal::ZERO);
        let vel_1m = window.velocity_pct(60, now_ms).unwrap_or(Decimal::ZERO);
        let vol_ratio = self.volume_ratio().await.unwrap_or(Decimal::ZERO);
        let is_peak = self.is_peak_hour(now_ms);

        let mut contributing = BTreeMap::new();
        contributing.insert("velocity_1m".to_string(), vel_1m);
        contributing.insert("velocity_5m".to_string(), vel_5m);
        contributing.insert("wick_drop".to_string(), ind.wick_drop_pct);
        contributing.insert("body_drop".to_string(), ind.body_drop_pct);
        contributing.insert("range_expansion".to_string(), ind.range_expansion);
        contributing.insert("volume_ratio".to_string(), vol_ratio);

        // Extreme: velocity alone, instant entry.
        if vel_1m <= md.extreme_velocity_1m || vel_5m <= md.extreme_velocity_5m {
            warn!(symbol = %self.symbol, velocity_1m = %vel_1m, velocity_5m = %vel_5m, wick = %ind.wick_drop_pct, peak = is_peak, "extreme moondrop");
            return Some(self.build(
                Direction::Short,
                Tier::Instant,
                6,
                Decimal::ONE,
                true,
                self.config.tiers.cooldown_tier1_secs,
                is_peak,
                contributing,
                now_ms,
            ));
        }

        // High: velocity or a deep wick.
        if vel_5m <= md.high_velocity_5m || ind.wick_drop_pct >= md.high_wick_drop {
            warn!(symbol = %self.symbol, velocity_5m = %vel_5m, wick = %ind.wick_drop_pct, volume_ratio = %vol_ratio, peak = is_peak, "high moondrop");
            return Some(self.build(
                Direction::Short,
                Tier::Fast,
                5,
                dec!(0.9),
                true,
                self.config.tiers.cooldown_tier2_secs,
                is_peak,
                contributing,
                now_ms,
            ));
        }

        // Medium: primary trigger OR'd across three conditions, then at
        // least one of four confirmations.
        let primary = ind.wick_drop_pct >= md.medium_wick_drop
            || vel_5m <= md.medium_velocity_5m
            || (ind.body_drop_pct >= md.medium_body_drop
                && ind.range_expansion >= md.medium_range_expansion);
        if primary {
            let confirmations = [
                vol_ratio >= md.confirm_volume_ratio,
                ind.range_expansion >= md.confirm_range_expansion,
                ind.body_drop_pct >= md.confirm_body_drop,
                ind.wick_drop_pct >= md.confirm_wick_drop,
            ]
            .iter()
            .filter(|&&ok| ok)
            .count();
            if confirmations >= 1 {
                info!(symbol = %self.symbol, velocity_5m = %vel_5m, wick = %ind.wick_drop_pct, confirmations, peak = is_peak, "medium moondrop");
                contributing.insert(
                    "confirmations".to_string(),
                    Decimal::from(confirmations as u64),
                );
                return Some(self.build(
                    Direction::Short,
                    Tier::Micro,
                    4,
                    dec!(0.8),
                    false,
                    self.config.tiers.cooldown_tier3_secs,
                    is_peak,
                    contributing,
                    now_ms,
                ));
            }
        }

        // Early: watch only, never a signal.
        if ind.wick_drop_pct >= md.early_wick_drop && vol_ratio >= md.early_volume_ratio {
            debug!(symbol = %self.symbol, wick = %ind.wick_drop_pct, volume_ratio = %vol_ratio, "early moondrop watch");
        }

        None
    }

    /// Current 5m candle volume against the trailing one-hour average.
    async fn volume_ratio(&self) -> Option<Decimal> {
        let baseline = self
            .feed
            .volume_baseline(&self.symbol, VOLUME_BASELINE_CANDLES)
            .await?;
        if baseline <= Decimal::ZERO {
            return None;
        }
        let candles = self
            .feed
            .recent_candles(&self.symbol, CandleInterval::FiveMin, 1)
            .await?;
        let current = candles.last()?.volume;
        Some(current / baseline)
    }

    /// Count of same-direction candles among the most recent `required`
    /// one-minute candles.
    async fn consecutive_candles(&self, direction: Direction, required: usize) -> usize {
        let Some(candles) = self
            .feed
            .recent_candles(&self.symbol, CandleInterval::OneMin, required + 2)
            .await
        else {
            return 0;
        };
        if candles.len() < required {
            return 0;
        }
        candles[candles.len() - required..]
            .iter()
            .filter(|c| match direction {
                Direction::Long => c.is_bullish(),
                Direction::Short => c.is_bearish(),
            })
            .count()
    }

    fn is_peak_hour(&self, now_ms: u64) -> bool {
        let Some(now) = DateTime::<Utc>::from_timestamp_millis(now_ms as i64) else {
            return false;
        };
        let hour = now.hour() as u8;
        self.config
            .tiers
            .peak_hours_utc
            .iter()
            .any(|&(start, end)| start <= hour && hour < end)
    }

    fn adjusted(&self, base: Decimal, is_peak: bool) -> Decimal {
        if is_peak {
            base * (Decimal::ONE - self.config.tiers.peak_threshold_reduction)
        } else {
            base
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        direction: Direction,
        tier: Tier,
        score: u8,
        confidence: Decimal,
        bypass_checks: bool,
        cooldown_secs: u64,
        is_peak_window: bool,
        contributing: BTreeMap<String, Decimal>,
        now_ms: u64,
    ) -> Signal {
        Signal {
            symbol: self.symbol.clone(),
            direction,
            tier,
            score,
            confidence,
            bypass_checks,
            cooldown_secs,
            is_peak_window,
            contributing,
            detected_at_ms: now_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surge_core::{Candle, Price};
    use surge_feed::{MockMarketData, PriceObservation};

    // 2025-06-01 12:00:00 UTC, outside the peak window.
    const NOON_MS: u64 = 1_748_779_200_000;
    // 2025-06-01 19:00:00 UTC, inside the peak window.
    const PEAK_MS: u64 = 1_748_804_400_000;

    fn window_with_move(start: Decimal, end: Decimal, span_secs: u64, now_ms: u64) -> PriceWindow {
        let mut w = PriceWindow::new();
        w.push(PriceObservation {
            timestamp_ms: now_ms - span_secs * 1000,
            price: Price::new(start),
            volume: None,
        });
        w.push(PriceObservation {
            timestamp_ms: now_ms,
            price: Price::new(end),
            volume: None,
        });
        w
    }

    fn candle(open: Decimal, high: Decimal, low: Decimal, close: Decimal, vol: Decimal) -> Candle {
        Candle {
            open: Price::new(open),
            high: Price::new(high),
            low: Price::new(low),
            close: Price::new(close),
            volume: vol,
        }
    }

    fn flat_candles(n: usize) -> Vec<Candle> {
        vec![candle(dec!(100), dec!(100.2), dec!(99.8), dec!(100), dec!(100)); n]
    }

    fn classifier(feed: MockMarketData) -> TierClassifier {
        TierClassifier::new(
            Symbol::from("TESTUSDT"),
            DetectorConfig::default(),
            Arc::new(feed),
        )
    }

    #[tokio::test]
    async fn test_tier1_long_fires_on_velocity_alone() {
        // +3% in 5 minutes, no feed access needed.
        let window = window_with_move(dec!(100), dec!(103), 300, NOON_MS);
        let mut c = classifier(MockMarketData::new());

        let signal = c.scan(&window, NOON_MS).await.unwrap();
        assert_eq!(signal.tier, Tier::Instant);
        assert_eq!(signal.direction, Direction::Long);
        assert_eq!(signal.score, 6);
        assert!(signal.bypass_checks);
        assert_eq!(signal.cooldown_secs, 30);
        assert!(!signal.is_peak_window);
    }

    #[tokio::test]
    async fn test_tier1_threshold_lowered_during_peak() {
        // +2% trips nothing at noon but clears the reduced 1.875% peak
        // threshold.
        let window = window_with_move(dec!(100), dec!(102), 300, PEAK_MS);
        let mut c = classifier(MockMarketData::new());

        let signal = c.scan(&window, PEAK_MS).await.unwrap();
        assert_eq!(signal.tier, Tier::Instant);
        assert!(signal.is_peak_window);
    }

    #[tokio::test]
    async fn test_tier1_fires_at_exact_peak_threshold() {
        // 2.5% * 0.75 = 1.875%; a move landing exactly on the reduced
        // threshold must fire.
        let window = window_with_move(dec!(100), dec!(101.875), 300, PEAK_MS);
        let mut c = classifier(MockMarketData::new());

        let signal = c.scan(&window, PEAK_MS).await.unwrap();
        assert_eq!(signal.tier, Tier::Instant);
        assert!(signal.is_peak_window);
    }

    #[tokio::test]
    async fn test_tier2_requires_volume_spike() {
        // +2% in 5 minutes with 2x volume.
        let window = window_with_move(dec!(100), dec!(102), 300, NOON_MS);
        let mut feed = MockMarketData::new();
        feed.expect_volume_baseline().returning(|_, _| Some(dec!(500)));
        feed.expect_recent_candles().returning(|_, interval, _| {
            match interval {
                CandleInterval::FiveMin => {
                    Some(vec![candle(dec!(100), dec!(102), dec!(100), dec!(102), dec!(1000))])
                }
                CandleInterval::OneMin => None,
            }
        });
        let mut c = classifier(feed);

        let signal = c.scan(&window, NOON_MS).await.unwrap();
        assert_eq!(signal.tier, Tier::Fast);
        assert_eq!(signal.score, 5);
        assert!(signal.bypass_checks);
        assert_eq!(signal.cooldown_secs, 60);
    }

    #[tokio::test]
    async fn test_momentum_stack_long() {
        // 5m velocity +0.6%, with an hour-long grind upward in the 5m
        // candles. Volume is flat so tier 2 does not fire first.
        let window = window_with_move(dec!(105), dec!(105.7), 300, NOON_MS);
        let mut feed = MockMarketData::new();
        feed.expect_volume_baseline().returning(|_, _| None);
        feed.expect_recent_candles().returning(|_, interval, limit| {
            if interval == CandleInterval::FiveMin && limit == MOMENTUM_CANDLES_5M {
                // Steady climb: each candle opens where the previous
                // closed, +0.4 per candle from 102.
                let candles = (0..13)
                    .map(|i| {
                        let open = dec!(102) + Decimal::from(i as u64) * dec!(0.4);
                        let close = open + dec!(0.4);
                        candle(open, close, open, close, dec!(100))
                    })
                    .collect();
                Some(candles)
            } else {
                None
            }
        });
        let mut c = classifier(feed);

        let signal = c.scan(&window, NOON_MS).await.unwrap();
        assert_eq!(signal.tier, Tier::Fast);
        assert_eq!(signal.confidence, dec!(0.85));
        assert!(signal.bypass_checks);
        assert!(signal.contributing.contains_key("momentum_stack"));
        assert!(signal.contributing.contains_key("change_1h"));
    }

    #[tokio::test]
    async fn test_tier3_needs_consecutive_candles() {
        // +1.6% in one minute, but only 2 of the last 3 candles bullish:
        // long side falls through and no other tier fires.
        let window = window_with_move(dec!(100), dec!(101.6), 60, NOON_MS);
        let mut feed = MockMarketData::new();
        feed.expect_volume_baseline().returning(|_, _| None);
        feed.expect_change_24h_pct().returning(|_| None);
        feed.expect_open_interest().returning(|_| None);
        feed.expect_funding_rate().returning(|_| None);
        feed.expect_orderbook_imbalance().returning(|_| None);
        feed.expect_breakout_band().returning(|_| None);
        feed.expect_recent_candles().returning(|_, interval, _| {
            match interval {
                CandleInterval::OneMin => Some(vec![
                    candle(dec!(100), dec!(100.5), dec!(100), dec!(100.5), dec!(10)),
                    candle(dec!(100.5), dec!(100.6), dec!(100.2), dec!(100.3), dec!(10)),
                    candle(dec!(100.3), dec!(101.6), dec!(100.3), dec!(101.6), dec!(10)),
                ]),
                CandleInterval::FiveMin => None,
            }
        });
        let mut c = classifier(feed);

        assert!(c.scan(&window, NOON_MS).await.is_none());
    }

    #[tokio::test]
    async fn test_tier3_fires_with_run() {
        let window = window_with_move(dec!(100), dec!(101.6), 60, NOON_MS);
        let mut feed = MockMarketData::new();
        feed.expect_recent_candles().returning(|_, interval, _| {
            match interval {
                CandleInterval::OneMin => Some(vec![
                    candle(dec!(100), dec!(100.5), dec!(100), dec!(100.5), dec!(10)),
                    candle(dec!(100.5), dec!(101), dec!(100.5), dec!(101), dec!(10)),
                    candle(dec!(101), dec!(101.6), dec!(101), dec!(101.6), dec!(10)),
                ]),
                CandleInterval::FiveMin => None,
            }
        });
        feed.expect_volume_baseline().returning(|_, _| None);
        let mut c = classifier(feed);

        let signal = c.scan(&window, NOON_MS).await.unwrap();
        assert_eq!(signal.tier, Tier::Micro);
        assert!(!signal.bypass_checks);
        assert_eq!(signal.cooldown_secs, 120);
    }

    #[tokio::test]
    async fn test_mega_pump_precheck() {
        // +0.2%/1m and +1.2%/5m: below every velocity tier, but the 24h
        // change is +45% and still moving.
        let mut window = PriceWindow::new();
        window.push(PriceObservation {
            timestamp_ms: NOON_MS - 300_000,
            price: Price::new(dec!(100)),
            volume: None,
        });
        window.push(PriceObservation {
            timestamp_ms: NOON_MS - 60_000,
            price: Price::new(dec!(101)),
            volume: None,
        });
        window.push(PriceObservation {
            timestamp_ms: NOON_MS,
            price: Price::new(dec!(101.2)),
            volume: None,
        });
        let mut feed = MockMarketData::new();
        feed.expect_volume_baseline().returning(|_, _| None);
        feed.expect_recent_candles().returning(|_, _, _| None);
        feed.expect_change_24h_pct().returning(|_| Some(dec!(45)));
        let mut c = classifier(feed);

        let signal = c.scan(&window, NOON_MS).await.unwrap();
        assert_eq!(signal.tier, Tier::Fast);
        assert_eq!(signal.confidence, dec!(0.8));
        assert!(signal.bypass_checks);
    }

    #[tokio::test]
    async fn test_legacy_score_requires_minimum() {
        // Quiet market, all indicators unavailable: funding-for-long is
        // the only check that passes, score 1 < 3.
        let window = window_with_move(dec!(100), dec!(100.1), 300, NOON_MS);
        let mut feed = MockMarketData::new();
        feed.expect_volume_baseline().returning(|_, _| None);
        feed.expect_recent_candles().returning(|_, _, _| None);
        feed.expect_change_24h_pct().returning(|_| None);
        feed.expect_open_interest().returning(|_| None);
        feed.expect_funding_rate().returning(|_| None);
        feed.expect_orderbook_imbalance().returning(|_| None);
        feed.expect_breakout_band().returning(|_| None);
        let mut c = classifier(feed);

        assert!(c.scan(&window, NOON_MS).await.is_none());
    }

    #[tokio::test]
    async fn test_legacy_long_with_three_checks() {
        // +1.6%/5m with a 0.6%/1m confirmation but flat volume, so tier
        // 2 does not fire. Price + funding + orderbook = 3.
        let mut window = PriceWindow::new();
        window.push(PriceObservation {
            timestamp_ms: NOON_MS - 300_000,
            price: Price::new(dec!(100)),
            volume: None,
        });
        window.push(PriceObservation {
            timestamp_ms: NOON_MS - 60_000,
            price: Price::new(dec!(101)),
            volume: None,
        });
        window.push(PriceObservation {
            timestamp_ms: NOON_MS,
            price: Price::new(dec!(101.6)),
            volume: None,
        });
        let mut feed = MockMarketData::new();
        feed.expect_volume_baseline().returning(|_, _| Some(dec!(100)));
        feed.expect_recent_candles().returning(|_, interval, limit| {
            if interval == CandleInterval::FiveMin && limit == 1 {
                Some(vec![candle(dec!(100), dec!(102), dec!(100), dec!(101.6), dec!(100))])
            } else {
                None
            }
        });
        feed.expect_change_24h_pct().returning(|_| None);
        feed.expect_open_interest().returning(|_| None);
        feed.expect_funding_rate().returning(|_| Some(dec!(0.0001)));
        feed.expect_orderbook_imbalance().returning(|_| Some(dec!(0.7)));
        feed.expect_breakout_band().returning(|_| None);
        let mut c = classifier(feed);

        let signal = c.scan(&window, NOON_MS).await.unwrap();
        assert_eq!(signal.tier, Tier::Legacy);
        assert_eq!(signal.score, 3);
        assert_eq!(signal.confidence, dec!(0.5));
        assert!(!signal.bypass_checks);
        assert_eq!(signal.cooldown_secs, 120);
    }

    #[tokio::test]
    async fn test_moondrop_extreme_precedes_generic_short() {
        // -3%/1m would also trip generic tier 1 short, but the moondrop
        // cascade runs first and claims it as an extreme drop.
        let window = window_with_move(dec!(100), dec!(97), 60, NOON_MS);
        let mut feed = MockMarketData::new();
        feed.expect_volume_baseline().returning(|_, _| Some(dec!(100)));
        feed.expect_recent_candles().returning(|_, interval, limit| {
            if interval == CandleInterval::FiveMin && limit >= 12 {
                Some(flat_candles(15))
            } else if interval == CandleInterval::FiveMin {
                Some(vec![candle(dec!(100), dec!(100), dec!(97), dec!(97), dec!(150))])
            } else {
                None
            }
        });
        feed.expect_change_24h_pct().returning(|_| None);
        feed.expect_open_interest().returning(|_| None);
        feed.expect_funding_rate().returning(|_| None);
        feed.expect_orderbook_imbalance().returning(|_| None);
        feed.expect_breakout_band().returning(|_| None);
        let mut c = classifier(feed);

        let signal = c.scan(&window, NOON_MS).await.unwrap();
        assert_eq!(signal.direction, Direction::Short);
        assert_eq!(signal.tier, Tier::Instant);
        assert!(signal.contributing.contains_key("wick_drop"));
    }

    #[tokio::test]
    async fn test_moondrop_medium_with_confirmation() {
        // A 2.1% wick trips the medium primary trigger, and the range
        // expansion against the quiet 0.4%-range baseline supplies the
        // one required confirmation.
        let window = window_with_move(dec!(100), dec!(99.9), 300, NOON_MS);
        let mut candles = flat_candles(14);
        candles.push(candle(dec!(100), dec!(100.2), dec!(98.1), dec!(100.1), dec!(100)));
        let mut feed = MockMarketData::new();
        let drop_candles = candles.clone();
        feed.expect_volume_baseline().returning(|_, _| None);
        feed.expect_recent_candles().returning(move |_, interval, limit| {
            if interval == CandleInterval::FiveMin && limit >= 12 {
                Some(drop_candles.clone())
            } else {
                None
            }
        });
        feed.expect_change_24h_pct().returning(|_| None);
        feed.expect_open_interest().returning(|_| None);
        feed.expect_funding_rate().returning(|_| None);
        feed.expect_orderbook_imbalance().returning(|_| None);
        feed.expect_breakout_band().returning(|_| None);
        let mut c = classifier(feed);

        let signal = c.scan(&window, NOON_MS).await.unwrap();
        assert_eq!(signal.tier, Tier::Micro);
        assert_eq!(signal.direction, Direction::Short);
        assert!(!signal.bypass_checks);
        assert_eq!(signal.confidence, dec!(0.8));
    }

    #[tokio::test]
    async fn test_no_signal_on_quiet_market() {
        let window = window_with_move(dec!(100), dec!(100.05), 300, NOON_MS);
        let mut feed = MockMarketData::new();
        feed.expect_volume_baseline().returning(|_, _| None);
        feed.expect_recent_candles().returning(|_, interval, limit| {
            if interval == CandleInterval::FiveMin && limit >= 12 {
                Some(flat_candles(15))
            } else {
                None
            }
        });
        feed.expect_change_24h_pct().returning(|_| None);
        feed.expect_open_interest().returning(|_| None);
        feed.expect_funding_rate().returning(|_| None);
        feed.expect_orderbook_imbalance().returning(|_| None);
        feed.expect_breakout_band().returning(|_| None);
        let mut c = classifier(feed);

        assert!(c.scan(&window, NOON_MS).await.is_none());
    }
}
