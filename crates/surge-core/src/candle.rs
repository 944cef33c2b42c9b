//! OHLCV candle type used by candle-shape checks.

use crate::Price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Candle interval for market data lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandleInterval {
    OneMin,
    FiveMin,
}

/// A single OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: Decimal,
}

impl Candle {
    pub fn new(open: Price, high: Price, low: Price, close: Price, volume: Decimal) -> Self {
        Self {
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Close above open.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Close below open.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Full high-to-low range as a percentage of the high.
    ///
    /// Returns `None` when the high is zero (no data).
    pub fn range_pct(&self) -> Option<Decimal> {
        if !self.high.is_positive() {
            return None;
        }
        Some((self.high.inner() - self.low.inner()) / self.high.inner() * Decimal::from(100))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn candle(open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Candle {
        Candle::new(
            Price::new(open),
            Price::new(high),
            Price::new(low),
            Price::new(close),
            dec!(1000),
        )
    }

    #[test]
    fn test_bullish_bearish() {
        assert!(candle(dec!(100), dec!(105), dec!(99), dec!(104)).is_bullish());
        assert!(candle(dec!(100), dec!(101), dec!(95), dec!(96)).is_bearish());
        let doji = candle(dec!(100), dec!(101), dec!(99), dec!(100));
        assert!(!doji.is_bullish() && !doji.is_bearish());
    }

    #[test]
    fn test_range_pct() {
        let c = candle(dec!(100), dec!(100), dec!(98), dec!(99));
        assert_eq!(c.range_pct(), Some(dec!(2)));
        let empty = candle(dec!(0), dec!(0), dec!(0), dec!(0));
        assert!(empty.range_pct().is_none());
    }
}
