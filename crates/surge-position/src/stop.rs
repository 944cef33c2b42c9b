//! Initial protective stop placement.

use crate::config::StopConfig;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use surge_core::{Direction, Price};

/// Place the initial stop: the more conservative of a fixed percentage
/// from entry and a buffer outside the leverage-implied liquidation
/// price. The stop never sits inside the liquidation buffer.
///
/// Liquidation is approximated as `entry * (1 -/+ 1/leverage)`.
pub fn initial_stop(
    entry: Price,
    direction: Direction,
    leverage: u32,
    config: &StopConfig,
) -> Price {
    let leverage = if leverage == 0 { 10 } else { leverage };
    let inv_leverage = Decimal::ONE / Decimal::from(leverage);
    let sl = config.initial_pct / dec!(100);
    let buffer = config.liq_buffer_pct / dec!(100);

    match direction {
        Direction::Long => {
            let liquidation = entry.inner() * (Decimal::ONE - inv_leverage);
            let from_config = entry.inner() * (Decimal::ONE - sl);
            let from_liq = liquidation * (Decimal::ONE + buffer);
            Price::new(from_config.max(from_liq))
        }
        Direction::Short => {
            let liquidation = entry.inner() * (Decimal::ONE + inv_leverage);
            let from_config = entry.inner() * (Decimal::ONE + sl);
            let from_liq = liquidation * (Decimal::ONE - buffer);
            Price::new(from_config.min(from_liq))
        }
    }
}
