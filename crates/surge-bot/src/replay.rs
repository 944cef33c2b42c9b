//! Offline replay collaborators.
//!
//! Drive the full pipeline from a recorded tick file with no exchange
//! attached: the feed serves the last replayed observation, auxiliary
//! indicators are unavailable (velocity-only tiers still fire), orders
//! fill instantly at the last price.

use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use surge_core::{Candle, CandleInterval, Direction, Price, Regime, Symbol};
use surge_feed::{
    EntryFill, ExecutorError, ExecutorResult, MarketData, OrderExecutor, PriceObservation,
    RegimeSource,
};
use tracing::info;

/// One line of a JSON-lines replay file.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayRecord {
    pub timestamp_ms: u64,
    pub symbol: String,
    pub price: Decimal,
    #[serde(default)]
    pub volume: Option<Decimal>,
}

impl ReplayRecord {
    pub fn observation(&self) -> PriceObservation {
        PriceObservation::new(self.timestamp_ms, Price::new(self.price), self.volume)
    }
}

/// Serves the most recently replayed observation per symbol. All other
/// indicators report unavailable, which the cascade treats as
/// "condition not met".
#[derive(Default)]
pub struct ReplayFeed {
    latest: RwLock<HashMap<Symbol, PriceObservation>>,
}

impl ReplayFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, symbol: &Symbol, obs: PriceObservation) {
        self.latest.write().insert(symbol.clone(), obs);
    }

    pub fn latest_price(&self, symbol: &Symbol) -> Option<Price> {
        self.latest.read().get(symbol).map(|obs| obs.price)
    }
}

#[async_trait]
impl MarketData for ReplayFeed {
    async fn price_observation(&self, symbol: &Symbol) -> Option<PriceObservation> {
        self.latest.read().get(symbol).copied()
    }

    async fn volume_baseline(&self, _symbol: &Symbol, _window: usize) -> Option<Decimal> {
        None
    }

    async fn recent_candles(
        &self,
        _symbol: &Symbol,
        _interval: CandleInterval,
        _limit: usize,
    ) -> Option<Vec<Candle>> {
        None
    }

    async fn open_interest(&self, _symbol: &Symbol) -> Option<Decimal> {
        None
    }

    async fn funding_rate(&self, _symbol: &Symbol) -> Option<Decimal> {
        None
    }

    async fn orderbook_imbalance(&self, _symbol: &Symbol) -> Option<Decimal> {
        None
    }

    async fn change_24h_pct(&self, _symbol: &Symbol) -> Option<Decimal> {
        None
    }

    async fn breakout_band(&self, _symbol: &Symbol) -> Option<(Price, Price, Decimal)> {
        None
    }
}

/// Fills every order instantly at the last replayed price.
pub struct PaperExecutor {
    feed: Arc<ReplayFeed>,
}

impl PaperExecutor {
    pub fn new(feed: Arc<ReplayFeed>) -> Self {
        Self { feed }
    }
}

#[async_trait]
impl OrderExecutor for PaperExecutor {
    async fn place_entry(
        &self,
        symbol: &Symbol,
        direction: Direction,
        margin: Decimal,
        leverage: u32,
        stop_price: Price,
    ) -> ExecutorResult<EntryFill> {
        let fill_price = self
            .feed
            .latest_price(symbol)
            .ok_or_else(|| ExecutorError::Unavailable(format!("no replay price for {symbol}")))?;
        info!(%symbol, %direction, %margin, leverage, %fill_price, %stop_price, "paper entry");
        Ok(EntryFill { fill_price })
    }

    async fn close_position(&self, symbol: &Symbol, percent: Decimal) -> ExecutorResult<()> {
        let price = self.feed.latest_price(symbol);
        info!(%symbol, %percent, last_price = ?price, "paper close");
        Ok(())
    }

    async fn update_stop(&self, symbol: &Symbol, price: Price) -> ExecutorResult<()> {
        info!(%symbol, %price, "paper stop update");
        Ok(())
    }
}

/// Constant regime for replay runs.
pub struct StaticRegime(pub Regime);

impl RegimeSource for StaticRegime {
    fn regime(&self) -> Regime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_paper_fill_at_last_replayed_price() {
        let feed = Arc::new(ReplayFeed::new());
        let executor = PaperExecutor::new(feed.clone());
        let symbol = Symbol::from("DOGEUSDT");

        let err = executor
            .place_entry(&symbol, Direction::Long, dec!(10), 10, Price::new(dec!(96.5)))
            .await;
        assert!(err.is_err());

        feed.record(
            &symbol,
            PriceObservation::new(1_700_000_000_000, Price::new(dec!(0.42)), None),
        );
        let fill = executor
            .place_entry(&symbol, Direction::Long, dec!(10), 10, Price::new(dec!(0.405)))
            .await
            .unwrap();
        assert_eq!(fill.fill_price.inner(), dec!(0.42));
    }

    #[test]
    fn test_replay_record_parses() {
        let line = r#"{"timestamp_ms": 1700000000000, "symbol": "DOGEUSDT", "price": "0.42"}"#;
        let rec: ReplayRecord = serde_json::from_str(line).unwrap();
        assert_eq!(rec.symbol, "DOGEUSDT");
        assert_eq!(rec.observation().price.inner(), dec!(0.42));
        assert!(rec.volume.is_none());
    }
}
