//! Exit configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Initial protective stop placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopConfig {
    /// Fixed stop distance from entry, percent.
    pub initial_pct: Decimal,
    /// Buffer kept between the stop and the leverage-implied
    /// liquidation price, percent of the liquidation price.
    pub liq_buffer_pct: Decimal,
}

impl Default for StopConfig {
    fn default() -> Self {
        Self {
            initial_pct: dec!(3.5),
            liq_buffer_pct: dec!(1.5),
        }
    }
}

/// Velocity-reversal protection thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VelocityExitConfig {
    /// 1m velocity against the position at which everything is closed.
    pub severe_velocity_1m: Decimal,
    /// Milder reversal that closes a partial, once per position.
    pub partial_velocity_1m: Decimal,
    pub partial_close_pct: Decimal,
}

impl Default for VelocityExitConfig {
    fn default() -> Self {
        Self {
            severe_velocity_1m: dec!(-3.0),
            partial_velocity_1m: dec!(-2.0),
            partial_close_pct: dec!(50),
        }
    }
}

/// Fast-pump profit lock-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstantPumpConfig {
    /// Window from entry during which the lock-in applies, seconds.
    pub window_secs: u64,
    /// Profit that triggers the lock-in, percent.
    pub profit_pct: Decimal,
    pub close_pct: Decimal,
}

impl Default for InstantPumpConfig {
    fn default() -> Self {
        Self {
            window_secs: 600,
            profit_pct: dec!(5),
            close_pct: dec!(50),
        }
    }
}

/// Funding-rate exit thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingExitConfig {
    /// Funding rate magnitude that triggers the check.
    pub max_rate: Decimal,
    /// Below this profit the position is closed fully.
    pub full_close_below_profit_pct: Decimal,
    /// Above this profit only a partial is taken.
    pub partial_above_profit_pct: Decimal,
    pub partial_close_pct: Decimal,
}

impl Default for FundingExitConfig {
    fn default() -> Self {
        Self {
            max_rate: dec!(0.001),
            full_close_below_profit_pct: dec!(2),
            partial_above_profit_pct: dec!(5),
            partial_close_pct: dec!(50),
        }
    }
}

/// Side effect applied when a take-profit level is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TpEffect {
    MoveStopBreakeven,
    ActivateTrailing,
    /// Close only, leave the rest running.
    LetRide,
}

/// One staged take-profit level. Consumed at most once per position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TakeProfitLevel {
    pub profit_pct: Decimal,
    pub close_pct: Decimal,
    pub effect: TpEffect,
}

/// Trailing distance for a peak-profit band.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrailingBand {
    /// Band applies once peak profit reaches this level, percent.
    pub min_peak_profit_pct: Decimal,
    /// Retrace from the favorable extreme that closes the position.
    pub distance_pct: Decimal,
}

/// Tiered trailing stop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailingConfig {
    /// Profit at which trailing activates early (also snaps the stop to
    /// breakeven).
    pub activation_profit_pct: Decimal,
    /// Bands ordered by `min_peak_profit_pct`; distances widen with
    /// profit so outsized winners get room to run.
    pub bands: Vec<TrailingBand>,
}

impl Default for TrailingConfig {
    fn default() -> Self {
        Self {
            activation_profit_pct: dec!(2),
            bands: vec![
                TrailingBand {
                    min_peak_profit_pct: dec!(2),
                    distance_pct: dec!(2),
                },
                TrailingBand {
                    min_peak_profit_pct: dec!(5),
                    distance_pct: dec!(3),
                },
                TrailingBand {
                    min_peak_profit_pct: dec!(10),
                    distance_pct: dec!(4),
                },
                TrailingBand {
                    min_peak_profit_pct: dec!(20),
                    distance_pct: dec!(5),
                },
            ],
        }
    }
}

/// Full exit-machine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitConfig {
    #[serde(default)]
    pub stop: StopConfig,
    #[serde(default)]
    pub velocity: VelocityExitConfig,
    #[serde(default)]
    pub instant_pump: InstantPumpConfig,
    #[serde(default)]
    pub funding: FundingExitConfig,
    #[serde(default = "default_take_profit_levels")]
    pub take_profit: Vec<TakeProfitLevel>,
    #[serde(default)]
    pub trailing: TrailingConfig,
    #[serde(default = "default_max_hold_hours")]
    pub max_hold_hours: u64,
}

fn default_take_profit_levels() -> Vec<TakeProfitLevel> {
    vec![
        TakeProfitLevel {
            profit_pct: dec!(5),
            close_pct: dec!(30),
            effect: TpEffect::MoveStopBreakeven,
        },
        TakeProfitLevel {
            profit_pct: dec!(10),
            close_pct: dec!(25),
            effect: TpEffect::ActivateTrailing,
        },
        TakeProfitLevel {
            profit_pct: dec!(20),
            close_pct: dec!(25),
            effect: TpEffect::LetRide,
        },
        TakeProfitLevel {
            profit_pct: dec!(50),
            close_pct: dec!(20),
            effect: TpEffect::LetRide,
        },
    ]
}

fn default_max_hold_hours() -> u64 {
    168
}

impl Default for ExitConfig {
    fn default() -> Self {
        Self {
            stop: StopConfig::default(),
            velocity: VelocityExitConfig::default(),
            instant_pump: InstantPumpConfig::default(),
            funding: FundingExitConfig::default(),
            take_profit: default_take_profit_levels(),
            trailing: TrailingConfig::default(),
            max_hold_hours: default_max_hold_hours(),
        }
    }
}

impl ExitConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.stop.initial_pct <= Decimal::ZERO {
            return Err("stop initial_pct must be positive".to_string());
        }
        if self.velocity.severe_velocity_1m >= self.velocity.partial_velocity_1m {
            return Err(format!(
                "severe_velocity_1m ({}) must be below partial_velocity_1m ({})",
                self.velocity.severe_velocity_1m, self.velocity.partial_velocity_1m
            ));
        }
        let mut prev_profit = Decimal::MIN;
        for level in &self.take_profit {
            if level.profit_pct <= prev_profit {
                return Err("take_profit levels must have strictly increasing profit".to_string());
            }
            if level.close_pct <= Decimal::ZERO || level.close_pct > dec!(100) {
                return Err(format!(
                    "take_profit close_pct ({}) must be in (0, 100]",
                    level.close_pct
                ));
            }
            prev_profit = level.profit_pct;
        }
        if self.trailing.bands.is_empty() {
            return Err("trailing bands must not be empty".to_string());
        }
        let mut prev = (Decimal::MIN, Decimal::MIN);
        for band in &self.trailing.bands {
            // Distances must strictly widen band to band.
            if band.min_peak_profit_pct <= prev.0 || band.distance_pct <= prev.1 {
                return Err("trailing bands must strictly widen".to_string());
            }
            prev = (band.min_peak_profit_pct, band.distance_pct);
        }
        if self.max_hold_hours == 0 {
            return Err("max_hold_hours must be positive".to_string());
        }
        Ok(())
    }
}
