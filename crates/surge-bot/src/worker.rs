//! Per-symbol worker task.
//!
//! Each worker owns its symbol's `PriceWindow` and classifier and
//! processes observations strictly in arrival order, so every velocity
//! query and cascade scan sees a consistent window. Workers never touch
//! shared state; ticks and signals go to the engine over one queue.

use crate::engine::EngineEvent;
use std::sync::Arc;
use surge_core::Symbol;
use surge_detector::{DetectorConfig, TierClassifier};
use surge_feed::{MarketData, PriceObservation, PriceWindow};
use tokio::sync::mpsc;
use tracing::debug;

pub struct SymbolWorker {
    symbol: Symbol,
    window: PriceWindow,
    classifier: TierClassifier,
    events: mpsc::Sender<EngineEvent>,
}

impl SymbolWorker {
    pub fn new(
        symbol: Symbol,
        config: DetectorConfig,
        feed: Arc<dyn MarketData>,
        events: mpsc::Sender<EngineEvent>,
    ) -> Self {
        let classifier = TierClassifier::new(symbol.clone(), config, feed);
        Self {
            symbol,
            window: PriceWindow::new(),
            classifier,
            events,
        }
    }

    /// Consume observations until the producer hangs up, then exit.
    /// The queue is drained fully so in-flight exit evaluations are
    /// never dropped on shutdown.
    pub async fn run(mut self, mut ticks: mpsc::Receiver<PriceObservation>) {
        while let Some(obs) = ticks.recv().await {
            if !self.scan(obs).await {
                break;
            }
        }
        debug!(symbol = %self.symbol, "worker exiting");
    }

    /// Process one observation: update the window, emit a tick for the
    /// exit cascade, then run the classifier. Returns `false` once the
    /// engine is gone.
    pub async fn scan(&mut self, obs: PriceObservation) -> bool {
        let now_ms = obs.timestamp_ms;
        self.window.push(obs);
        let price = match self.window.latest_price() {
            Some(price) => price,
            None => return true,
        };

        let velocity_1m = self.window.velocity_pct(60, now_ms);
        let tick = EngineEvent::Tick {
            symbol: self.symbol.clone(),
            price,
            velocity_1m,
            now_ms,
        };
        if self.events.send(tick).await.is_err() {
            return false;
        }

        if let Some(signal) = self.classifier.scan(&self.window, now_ms).await {
            let event = EngineEvent::Signal {
                signal,
                last_price: Some(price),
            };
            if self.events.send(event).await.is_err() {
                return false;
            }
        }
        true
    }
}
