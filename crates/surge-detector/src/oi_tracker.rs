//! Open-interest history for surge detection.

use rust_decimal::Decimal;
use std::collections::VecDeque;

/// History retention.
const MAX_AGE_SECS: u64 = 1800;
/// Minimum span before a delta is meaningful.
const MIN_SPAN_SECS: u64 = 900;

/// Rolling open-interest samples for one instrument.
///
/// Owned by the instrument's classifier, so no locking. Samples older
/// than 30 minutes are pruned on push.
#[derive(Debug, Default)]
pub struct OiTracker {
    samples: VecDeque<(u64, Decimal)>,
}

impl OiTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sample. Out-of-order timestamps are dropped.
    pub fn push(&mut self, timestamp_ms: u64, open_interest: Decimal) {
        if let Some(&(last_ts, _)) = self.samples.back() {
            if timestamp_ms <= last_ts {
                return;
            }
        }
        self.samples.push_back((timestamp_ms, open_interest));
        let cutoff = timestamp_ms.saturating_sub(MAX_AGE_SECS * 1000);
        while let Some(&(ts, _)) = self.samples.front() {
            if ts < cutoff {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Percent change from the oldest sample at least 15 minutes old to
    /// the newest. `None` until enough history has accumulated.
    pub fn surge_pct(&self, now_ms: u64) -> Option<Decimal> {
        let (newest_ts, newest) = *self.samples.back()?;
        let cutoff = now_ms.saturating_sub(MIN_SPAN_SECS * 1000);
        let (base_ts, base) = self
            .samples
            .iter()
            .copied()
            .find(|&(ts, _)| ts <= cutoff)?;
        if newest_ts <= base_ts || base.is_zero() {
            return None;
        }
        Some((newest - base) / base * Decimal::from(100))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
