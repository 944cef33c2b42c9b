//! Per-instrument rolling price buffer and velocity queries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use surge_core::Price;

/// Maximum look-back kept in a window: 15 minutes.
///
/// Observations older than this are discarded on every push to bound
/// memory per instrument.
pub const MAX_LOOKBACK_SECS: u64 = 900;

/// Minimum observations a span must contain before velocity is reported.
const MIN_OBSERVATIONS: usize = 2;

/// A single timestamped price/volume observation. Append-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Unix milliseconds.
    pub timestamp_ms: u64,
    pub price: Price,
    pub volume: Option<Decimal>,
}

impl PriceObservation {
    pub fn new(timestamp_ms: u64, price: Price, volume: Option<Decimal>) -> Self {
        Self {
            timestamp_ms,
            price,
            volume,
        }
    }
}

/// Rolling buffer of price observations for one instrument.
///
/// Supports velocity queries over arbitrary look-back spans up to
/// [`MAX_LOOKBACK_SECS`]. Velocity is the percentage change between the
/// oldest observation inside the requested span and the latest
/// observation.
///
/// A query over a span with too few observations, or where the oldest
/// observation covers less than half the requested span, returns `None`
/// ("not yet measurable") rather than `0` ("no movement").
#[derive(Debug, Clone, Default)]
pub struct PriceWindow {
    observations: VecDeque<PriceObservation>,
}

impl PriceWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observation and discard anything older than the
    /// maximum look-back. Out-of-order or zero-priced observations are
    /// ignored.
    pub fn push(&mut self, obs: PriceObservation) {
        if !obs.price.is_positive() {
            return;
        }
        if let Some(last) = self.observations.back() {
            if obs.timestamp_ms < last.timestamp_ms {
                return;
            }
        }
        self.observations.push_back(obs);

        let cutoff = obs.timestamp_ms.saturating_sub(MAX_LOOKBACK_SECS * 1000);
        while let Some(front) = self.observations.front() {
            if front.timestamp_ms < cutoff {
                self.observations.pop_front();
            } else {
                break;
            }
        }
    }

    /// Latest observed price, if any.
    pub fn latest_price(&self) -> Option<Price> {
        self.observations.back().map(|o| o.price)
    }

    /// Timestamp of the latest observation.
    pub fn latest_timestamp_ms(&self) -> Option<u64> {
        self.observations.back().map(|o| o.timestamp_ms)
    }

    /// Number of buffered observations.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Percentage price change over the trailing `span_secs` ending at
    /// `now_ms`.
    ///
    /// Returns `None` (insufficient data) when:
    /// - fewer than two observations fall inside the span, or
    /// - the oldest in-span observation covers less than half the span.
    pub fn velocity_pct(&self, span_secs: u64, now_ms: u64) -> Option<Decimal> {
        let cutoff = now_ms.saturating_sub(span_secs * 1000);

        let mut oldest: Option<&PriceObservation> = None;
        let mut in_span = 0usize;
        for obs in &self.observations {
            if obs.timestamp_ms >= cutoff {
                if oldest.is_none() {
                    oldest = Some(obs);
                }
                in_span += 1;
            }
        }

        let oldest = oldest?;
        let latest = self.observations.back()?;
        if in_span < MIN_OBSERVATIONS {
            return None;
        }
        // The oldest in-span observation must reach back at least half
        // the requested span, otherwise a 5m query over 10s of data
        // would masquerade as a 5m velocity.
        let covered_ms = latest.timestamp_ms.saturating_sub(oldest.timestamp_ms);
        if covered_ms < span_secs * 1000 / 2 {
            return None;
        }

        latest.price.pct_from(oldest.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn obs(ts_secs: u64, price: Decimal) -> PriceObservation {
        PriceObservation::new(ts_secs * 1000, Price::new(price), None)
    }

    #[test]
    fn test_velocity_insufficient_data_not_zero() {
        let mut w = PriceWindow::new();
        w.push(obs(1000, dec!(100)));
        // One observation: must be None, never Some(0).
        assert_eq!(w.velocity_pct(300, 1_000_000), None);
    }

    #[test]
    fn test_velocity_requires_span_coverage() {
        let mut w = PriceWindow::new();
        // Two observations only 10s apart cannot answer a 5m query.
        w.push(obs(1000, dec!(100)));
        w.push(obs(1010, dec!(105)));
        assert_eq!(w.velocity_pct(300, 1_010_000), None);
        // But they can answer a 15s query.
        assert_eq!(w.velocity_pct(15, 1_010_000), Some(dec!(5)));
    }

    #[test]
    fn test_velocity_basic() {
        let mut w = PriceWindow::new();
        w.push(obs(1000, dec!(100)));
        w.push(obs(1150, dec!(101)));
        w.push(obs(1295, dec!(102.5)));
        // 5m span covering all three: (102.5 - 100) / 100 = +2.5%
        assert_eq!(w.velocity_pct(300, 1_295_000), Some(dec!(2.5)));
    }

    #[test]
    fn test_velocity_flat_is_zero_not_none() {
        let mut w = PriceWindow::new();
        w.push(obs(1000, dec!(100)));
        w.push(obs(1290, dec!(100)));
        assert_eq!(w.velocity_pct(300, 1_290_000), Some(dec!(0)));
    }

    #[test]
    fn test_old_observations_pruned() {
        let mut w = PriceWindow::new();
        w.push(obs(0, dec!(50)));
        w.push(obs(MAX_LOOKBACK_SECS + 100, dec!(100)));
        assert_eq!(w.len(), 1);
        assert_eq!(w.latest_price(), Some(Price::new(dec!(100))));
    }

    #[test]
    fn test_rejects_bad_observations() {
        let mut w = PriceWindow::new();
        w.push(obs(1000, dec!(100)));
        w.push(obs(999, dec!(90))); // out of order
        w.push(obs(1001, dec!(0))); // zero price
        assert_eq!(w.len(), 1);
    }
}
