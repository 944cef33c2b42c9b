//! Gate and sizing configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use surge_position::StopConfig;

/// Pre-trade gate and sizing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Portfolio-wide cap on simultaneously open positions.
    pub max_positions: usize,
    /// Margin committed per trade, in quote currency.
    pub margin_per_trade: Decimal,
    /// Leverage for signals scoring at or above `high_score_min`.
    pub high_score_leverage: u32,
    /// Leverage for signals scoring at or above `mid_score_min`.
    pub mid_score_leverage: u32,
    /// Leverage for everything below `mid_score_min`.
    pub base_leverage: u32,
    pub high_score_min: u8,
    pub mid_score_min: u8,
    /// Initial stop placement, shared with the exit engine.
    pub stop: StopConfig,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_positions: 30,
            margin_per_trade: dec!(10),
            high_score_leverage: 20,
            mid_score_leverage: 15,
            base_leverage: 10,
            high_score_min: 6,
            mid_score_min: 5,
            stop: StopConfig::default(),
        }
    }
}

impl GateConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_positions == 0 {
            return Err("max_positions must be positive".to_string());
        }
        if self.margin_per_trade <= Decimal::ZERO {
            return Err("margin_per_trade must be positive".to_string());
        }
        if self.base_leverage == 0 {
            return Err("base_leverage must be positive".to_string());
        }
        if self.mid_score_leverage < self.base_leverage
            || self.high_score_leverage < self.mid_score_leverage
        {
            return Err("leverage must be non-decreasing with score".to_string());
        }
        if self.mid_score_min >= self.high_score_min {
            return Err("mid_score_min must be below high_score_min".to_string());
        }
        Ok(())
    }

    /// Leverage for a signal score.
    pub fn leverage_for_score(&self, score: u8) -> u32 {
        if score >= self.high_score_min {
            self.high_score_leverage
        } else if score >= self.mid_score_min {
            self.mid_score_leverage
        } else {
            self.base_leverage
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validates() {
        assert!(GateConfig::default().validate().is_ok());
    }

    #[test]
    fn test_leverage_tiers() {
        let config = GateConfig::default();
        assert_eq!(config.leverage_for_score(6), 20);
        assert_eq!(config.leverage_for_score(7), 20);
        assert_eq!(config.leverage_for_score(5), 15);
        assert_eq!(config.leverage_for_score(4), 10);
        assert_eq!(config.leverage_for_score(0), 10);
    }

    #[test]
    fn test_rejects_inverted_leverage_ladder() {
        let config = GateConfig {
            mid_score_leverage: 5,
            ..GateConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
