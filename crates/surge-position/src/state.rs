//! Per-position mutable state.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use surge_core::{Direction, Price, Symbol};

/// The only long-lived mutable entity in the decision core.
///
/// Created when a fill is confirmed, mutated exclusively by the exit
/// state machine on each tick, removed when `remaining_pct` reaches
/// zero. One-shot flags survive partial closes and reset only with
/// removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionState {
    pub symbol: Symbol,
    pub direction: Direction,
    pub entry_price: Price,
    pub margin: Decimal,
    pub leverage: u32,
    /// Protective stop; moves to breakeven on TP side effects and early
    /// trailing activation.
    pub stop_price: Price,
    /// Monotonically non-decreasing favorable extreme for longs.
    pub highest_price: Price,
    /// Monotonically non-increasing favorable extreme for shorts.
    pub lowest_price: Price,
    /// Highest profit reached over the position's lifetime, percent.
    pub peak_profit_pct: Decimal,
    pub trailing_active: bool,
    /// Indexes into the configured take-profit ladder that have fired.
    pub tp_levels_consumed: BTreeSet<usize>,
    /// Remaining fraction of the original size, `(0, 100]`.
    pub remaining_pct: Decimal,
    pub entry_time_ms: u64,
    pub velocity_partial_done: bool,
    pub instant_pump_done: bool,
}

impl PositionState {
    pub fn new(
        symbol: Symbol,
        direction: Direction,
        entry_price: Price,
        margin: Decimal,
        leverage: u32,
        stop_price: Price,
        entry_time_ms: u64,
    ) -> Self {
        Self {
            symbol,
            direction,
            entry_price,
            margin,
            leverage,
            stop_price,
            highest_price: entry_price,
            lowest_price: entry_price,
            peak_profit_pct: Decimal::ZERO,
            trailing_active: false,
            tp_levels_consumed: BTreeSet::new(),
            remaining_pct: dec!(100),
            entry_time_ms,
            velocity_partial_done: false,
            instant_pump_done: false,
        }
    }

    /// Signed profit at `current`, percent of entry. `None` when the
    /// entry price is invalid.
    pub fn profit_pct(&self, current: Price) -> Option<Decimal> {
        let raw = current.pct_from(self.entry_price)?;
        Some(raw * Decimal::from(self.direction.sign()))
    }

    /// Fold a new price into the favorable extremes.
    pub fn observe(&mut self, current: Price) {
        match self.direction {
            Direction::Long => {
                if current > self.highest_price {
                    self.highest_price = current;
                }
            }
            Direction::Short => {
                if current < self.lowest_price {
                    self.lowest_price = current;
                }
            }
        }
    }

    pub fn held_secs(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.entry_time_ms) / 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_position() -> PositionState {
        PositionState::new(
            Symbol::from("TESTUSDT"),
            Direction::Long,
            Price::new(dec!(100)),
            dec!(10),
            10,
            Price::new(dec!(96.5)),
            0,
        )
    }

    #[test]
    fn test_profit_sign_by_direction() {
        let long = long_position();
        assert_eq!(long.profit_pct(Price::new(dec!(105))), Some(dec!(5)));
        assert_eq!(long.profit_pct(Price::new(dec!(95))), Some(dec!(-5)));

        let mut short = long_position();
        short.direction = Direction::Short;
        assert_eq!(short.profit_pct(Price::new(dec!(95))), Some(dec!(5)));
    }

    #[test]
    fn test_extremes_are_monotonic() {
        let mut pos = long_position();
        pos.observe(Price::new(dec!(110)));
        pos.observe(Price::new(dec!(104)));
        assert_eq!(pos.highest_price.inner(), dec!(110));
        // Lowest never moves for a long.
        assert_eq!(pos.lowest_price.inner(), dec!(100));
    }
}
