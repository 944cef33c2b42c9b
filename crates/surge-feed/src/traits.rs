//! Collaborator contracts the decision core depends on.

use crate::error::ExecutorResult;
use crate::price_window::PriceObservation;
use async_trait::async_trait;
use rust_decimal::Decimal;
use surge_core::{Candle, CandleInterval, Direction, Price, Regime, Symbol};

/// Market data lookups.
///
/// Implementations wrap the exchange REST/WebSocket plumbing. All
/// methods return `Option`: `None` means the indicator is unavailable
/// right now. Callers treat that as "condition not met" so a single
/// stalled indicator degrades detection instead of halting it.
#[cfg_attr(any(test, feature = "test-mocks"), mockall::automock)]
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Latest price/volume observation for an instrument.
    async fn price_observation(&self, symbol: &Symbol) -> Option<PriceObservation>;

    /// Trailing average candle volume over `window` candles.
    async fn volume_baseline(&self, symbol: &Symbol, window: usize) -> Option<Decimal>;

    /// Most recent candles at the given interval, newest last. Used for
    /// candle-shape checks, consecutive-candle runs, and range-expansion
    /// baselines.
    async fn recent_candles(
        &self,
        symbol: &Symbol,
        interval: CandleInterval,
        limit: usize,
    ) -> Option<Vec<Candle>>;

    /// Current open interest.
    async fn open_interest(&self, symbol: &Symbol) -> Option<Decimal>;

    /// Current funding rate (signed).
    async fn funding_rate(&self, symbol: &Symbol) -> Option<Decimal>;

    /// Order book bid/ask imbalance in `[0, 1]`; above 0.5 means bids
    /// dominate.
    async fn orderbook_imbalance(&self, symbol: &Symbol) -> Option<Decimal>;

    /// 24h percentage change from the exchange ticker.
    async fn change_24h_pct(&self, symbol: &Symbol) -> Option<Decimal>;

    /// Support/resistance band for breakout checks: (support, resistance,
    /// atr) over the trailing day, excluding the current candle.
    async fn breakout_band(&self, symbol: &Symbol) -> Option<(Price, Price, Decimal)>;
}

/// Result of a successful entry placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryFill {
    pub fill_price: Price,
}

/// Order placement and protective stop management.
///
/// The decision core decides *what* to request; it never retries a
/// failed placement itself.
#[cfg_attr(any(test, feature = "test-mocks"), mockall::automock)]
#[async_trait]
pub trait OrderExecutor: Send + Sync {
    /// Place a market entry with leverage and an initial protective stop.
    async fn place_entry(
        &self,
        symbol: &Symbol,
        direction: Direction,
        margin: Decimal,
        leverage: u32,
        stop_price: Price,
    ) -> ExecutorResult<EntryFill>;

    /// Close a percentage of an open position (100 = full close).
    async fn close_position(&self, symbol: &Symbol, percent: Decimal) -> ExecutorResult<()>;

    /// Move the protective stop for an open position.
    async fn update_stop(&self, symbol: &Symbol, price: Price) -> ExecutorResult<()>;
}

/// Externally computed market regime.
pub trait RegimeSource: Send + Sync {
    fn regime(&self) -> Regime;
}
