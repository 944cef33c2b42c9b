//! Candle-shape indicators for short-side drop detection.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use surge_core::Candle;

/// Candles needed before range expansion is meaningful (current plus a
/// 12-candle trailing baseline).
const RANGE_BASELINE_LEN: usize = 12;

/// Shape indicators derived from one-minute candles, newest last.
///
/// Values are neutral (zero wick/body, 1.0x expansion) when the history
/// is too short, so an empty feed never fires a short.
#[derive(Debug, Clone, PartialEq)]
pub struct MoondropIndicators {
    /// Full candle range relative to the high, percent.
    pub wick_drop_pct: Decimal,
    /// Open-to-close drop for a bearish candle, percent. Zero for
    /// bullish candles.
    pub body_drop_pct: Decimal,
    /// Current candle range versus the trailing 12-candle average range.
    pub range_expansion: Decimal,
}

impl MoondropIndicators {
    pub fn from_candles(candles: &[Candle]) -> Self {
        Self {
            wick_drop_pct: wick_drop_pct(candles),
            body_drop_pct: body_drop_pct(candles),
            range_expansion: range_expansion(candles),
        }
    }
}

fn candle_range_pct(candle: &Candle) -> Option<Decimal> {
    if !candle.high.is_positive() {
        return None;
    }
    Some((candle.high.inner() - candle.low.inner()) / candle.high.inner() * dec!(100))
}

fn wick_drop_pct(candles: &[Candle]) -> Decimal {
    candles
        .last()
        .and_then(candle_range_pct)
        .unwrap_or(Decimal::ZERO)
}

fn body_drop_pct(candles: &[Candle]) -> Decimal {
    let Some(current) = candles.last() else {
        return Decimal::ZERO;
    };
    if !current.open.is_positive() || !current.is_bearish() {
        return Decimal::ZERO;
    }
    (current.open.inner() - current.close.inner()) / current.open.inner() * dec!(100)
}

fn range_expansion(candles: &[Candle]) -> Decimal {
    if candles.len() < RANGE_BASELINE_LEN + 1 {
        return Decimal::ONE;
    }
    let Some(current) = candles.last().and_then(candle_range_pct) else {
        return Decimal::ONE;
    };
    let baseline: Vec<Decimal> = candles[candles.len() - RANGE_BASELINE_LEN - 1..candles.len() - 1]
        .iter()
        .filter_map(candle_range_pct)
        .collect();
    if baseline.is_empty() {
        return Decimal::ONE;
    }
    let avg = baseline.iter().sum::<Decimal>() / Decimal::from(baseline.len() as u64);
    if avg <= Decimal::ZERO {
        return Decimal::ONE;
    }
    current / avg
}
