//! Detector configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Velocity tier thresholds and cooldowns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierConfig {
    /// Tier 1: 5m velocity magnitude (%) for instant entry.
    pub tier1_velocity_5m: Decimal,
    /// Tier 2: 5m velocity magnitude (%) for fast entry.
    pub tier2_velocity_5m: Decimal,
    /// Tier 2: current candle volume vs trailing average.
    pub tier2_volume_spike: Decimal,
    /// Tier 3: 1m velocity magnitude (%) for micro entry.
    pub tier3_velocity_1m: Decimal,
    /// Tier 3: consecutive same-direction candles required.
    pub tier3_consecutive_candles: usize,
    /// Re-entry cooldowns per tier, seconds.
    pub cooldown_tier1_secs: u64,
    pub cooldown_tier2_secs: u64,
    pub cooldown_tier3_secs: u64,
    pub cooldown_legacy_secs: u64,
    /// Peak time-of-day windows, UTC hours `[start, end)`.
    pub peak_hours_utc: Vec<(u8, u8)>,
    /// Fractional threshold reduction during peak windows.
    pub peak_threshold_reduction: Decimal,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            tier1_velocity_5m: dec!(2.5),
            tier2_velocity_5m: dec!(1.5),
            tier2_volume_spike: dec!(1.3),
            tier3_velocity_1m: dec!(1.5),
            tier3_consecutive_candles: 3,
            cooldown_tier1_secs: 30,
            cooldown_tier2_secs: 60,
            cooldown_tier3_secs: 120,
            cooldown_legacy_secs: 120,
            peak_hours_utc: vec![(18, 24), (0, 1)],
            peak_threshold_reduction: dec!(0.25),
        }
    }
}

/// Multi-timeframe momentum stack thresholds.
///
/// Catches gradual builds that never trip Tier 1: simultaneous
/// same-direction velocity across three nested windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentumConfig {
    pub velocity_1h: Decimal,
    pub velocity_15m: Decimal,
    pub velocity_5m: Decimal,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            velocity_1h: dec!(2.0),
            velocity_15m: dec!(1.0),
            velocity_5m: dec!(0.5),
        }
    }
}

/// Legacy six-check scoring thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyConfig {
    /// Minimum score (out of 6) to emit a signal.
    pub min_signals: u8,
    /// Current candle volume vs trailing average for the volume check.
    pub volume_spike_5m: Decimal,
    /// 5m velocity for the price-acceleration check.
    pub price_velocity_5m: Decimal,
    /// 1m velocity confirming acceleration.
    pub price_velocity_1m: Decimal,
    /// Very strong 5m move that bypasses the 1m confirmation entirely.
    pub strong_velocity_bypass_5m: Decimal,
    /// Strong 5m move that only needs a weak 1m confirmation.
    pub strong_velocity_5m: Decimal,
    /// Weak 1m confirmation used with `strong_velocity_5m`.
    pub weak_confirm_1m: Decimal,
    /// Open-interest change (%) over the 15m lookback.
    pub oi_surge_15m: Decimal,
    /// Funding band for longs: favorable when within `[floor, max]`.
    pub funding_max_for_long: Decimal,
    pub funding_floor_for_long: Decimal,
    /// Funding rate above which shorts see squeeze potential.
    pub funding_min_for_short: Decimal,
    /// Breakout band width as an ATR multiple.
    pub atr_multiplier: Decimal,
    /// Order book imbalance ratio threshold.
    pub imbalance_threshold: Decimal,
    /// 5m velocity magnitude that relaxes `min_signals` to the mega minimum.
    pub mega_velocity_5m: Decimal,
    pub mega_min_signals: u8,
    /// 24h change magnitude for the mega-pump pre-check.
    pub mega_pump_24h: Decimal,
    /// 5m follow-through magnitude required with the 24h move.
    pub mega_pump_followthrough_5m: Decimal,
}

impl Default for LegacyConfig {
    fn default() -> Self {
        Self {
            min_signals: 3,
            volume_spike_5m: dec!(2.0),
            price_velocity_5m: dec!(1.5),
            price_velocity_1m: dec!(0.5),
            strong_velocity_bypass_5m: dec!(5.0),
            strong_velocity_5m: dec!(3.0),
            weak_confirm_1m: dec!(0.2),
            oi_surge_15m: dec!(5.0),
            funding_max_for_long: dec!(0.003),
            funding_floor_for_long: dec!(-0.0002),
            funding_min_for_short: dec!(0.002),
            atr_multiplier: dec!(1.5),
            imbalance_threshold: dec!(0.65),
            mega_velocity_5m: dec!(3.0),
            mega_min_signals: 1,
            mega_pump_24h: dec!(20),
            mega_pump_followthrough_5m: dec!(1.0),
        }
    }
}

/// Moondrop cascade thresholds (short side, candle-shape driven).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoondropConfig {
    /// Extreme tier: instant short entry.
    pub extreme_velocity_1m: Decimal,
    pub extreme_velocity_5m: Decimal,
    /// High tier: fast short entry.
    pub high_velocity_5m: Decimal,
    pub high_wick_drop: Decimal,
    /// Medium tier primary triggers.
    pub medium_velocity_5m: Decimal,
    pub medium_wick_drop: Decimal,
    pub medium_body_drop: Decimal,
    pub medium_range_expansion: Decimal,
    /// Medium tier confirmation bars (at least one must cross).
    pub confirm_volume_ratio: Decimal,
    pub confirm_range_expansion: Decimal,
    pub confirm_body_drop: Decimal,
    pub confirm_wick_drop: Decimal,
    /// Early tier: watch-only, never emits a signal.
    pub early_wick_drop: Decimal,
    pub early_volume_ratio: Decimal,
}

impl Default for MoondropConfig {
    fn default() -> Self {
        Self {
            extreme_velocity_1m: dec!(-2.0),
            extreme_velocity_5m: dec!(-4.0),
            high_velocity_5m: dec!(-1.5),
            high_wick_drop: dec!(3.0),
            medium_velocity_5m: dec!(-0.8),
            medium_wick_drop: dec!(2.0),
            medium_body_drop: dec!(0.8),
            medium_range_expansion: dec!(1.3),
            confirm_volume_ratio: dec!(1.3),
            confirm_range_expansion: dec!(1.5),
            confirm_body_drop: dec!(1.0),
            confirm_wick_drop: dec!(2.5),
            early_wick_drop: dec!(1.5),
            early_volume_ratio: dec!(1.2),
        }
    }
}

/// Configuration for the tier classifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectorConfig {
    #[serde(default)]
    pub tiers: TierConfig,
    #[serde(default)]
    pub momentum: MomentumConfig,
    #[serde(default)]
    pub legacy: LegacyConfig,
    #[serde(default)]
    pub moondrop: MoondropConfig,
}

impl DetectorConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.tiers.tier2_velocity_5m > self.tiers.tier1_velocity_5m {
            return Err(format!(
                "tier2_velocity_5m ({}) must not exceed tier1_velocity_5m ({})",
                self.tiers.tier2_velocity_5m, self.tiers.tier1_velocity_5m
            ));
        }
        if self.tiers.peak_threshold_reduction >= Decimal::ONE
            || self.tiers.peak_threshold_reduction.is_sign_negative()
        {
            return Err(format!(
                "peak_threshold_reduction ({}) must be in [0, 1)",
                self.tiers.peak_threshold_reduction
            ));
        }
        if self.tiers.tier3_consecutive_candles == 0 {
            return Err("tier3_consecutive_candles must be at least 1".to_string());
        }
        if self.legacy.min_signals == 0 || self.legacy.min_signals > 6 {
            return Err(format!(
                "min_signals ({}) must be in 1..=6",
                self.legacy.min_signals
            ));
        }
        for (start, end) in &self.tiers.peak_hours_utc {
            if *start >= 24 || *end > 24 || start >= end {
                return Err(format!("invalid peak hour range {start}..{end}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(DetectorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_tier_ordering() {
        let mut config = DetectorConfig::default();
        config.tiers.tier2_velocity_5m = dec!(3.0);
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("must not exceed"));
    }

    #[test]
    fn test_validate_peak_reduction_range() {
        let mut config = DetectorConfig::default();
        config.tiers.peak_threshold_reduction = dec!(1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_peak_hours() {
        let mut config = DetectorConfig::default();
        config.tiers.peak_hours_utc = vec![(22, 22)];
        assert!(config.validate().is_err());
    }
}
