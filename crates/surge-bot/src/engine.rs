//! Engine: the single task that owns gate decisions and the position book.
//!
//! Per-symbol workers do the scanning; everything that touches shared
//! state (capacity, cooldowns, open positions) funnels through here via
//! one mpsc queue, so gate decisions and exit actions are serialized in
//! arrival order.

use crate::config::AppConfig;
use crate::error::AppResult;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use surge_core::{Price, Regime, Symbol};
use surge_detector::Signal;
use surge_feed::{EntryFill, MarketData, OrderExecutor, RegimeSource};
use surge_position::{ExitAction, ExitKind, ExitStateMachine};
use surge_risk::{TradeGate, TradePlan};
use surge_telemetry::metrics;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Work sent from symbol workers to the engine.
#[derive(Debug)]
pub enum EngineEvent {
    /// A fresh observation; drives the exit cascade.
    Tick {
        symbol: Symbol,
        price: Price,
        velocity_1m: Option<Decimal>,
        now_ms: u64,
    },
    /// The classifier fired for a symbol.
    Signal {
        signal: Signal,
        last_price: Option<Price>,
    },
}

pub struct Engine {
    gate: TradeGate,
    exits: ExitStateMachine,
    executor: Arc<dyn OrderExecutor>,
    regime: Arc<dyn RegimeSource>,
    last_regime: Regime,
    regime_poll: Duration,
}

impl Engine {
    pub fn new(
        config: &AppConfig,
        feed: Arc<dyn MarketData>,
        executor: Arc<dyn OrderExecutor>,
        regime: Arc<dyn RegimeSource>,
    ) -> Self {
        let last_regime = regime.regime();
        Self {
            gate: TradeGate::new(config.gate.clone(), regime.clone()),
            exits: ExitStateMachine::new(config.exit.clone(), feed),
            executor,
            regime,
            last_regime,
            regime_poll: Duration::from_secs(config.regime_poll_secs),
        }
    }

    /// Main loop: drain worker events, poll the regime, stop on ctrl-c
    /// or when every worker has hung up.
    pub async fn run(mut self, mut events: mpsc::Receiver<EngineEvent>) -> AppResult<()> {
        info!("Entering engine loop");
        let mut regime_interval = tokio::time::interval(self.regime_poll);

        loop {
            tokio::select! {
                maybe_event = events.recv() => match maybe_event {
                    Some(event) => self.handle(event).await,
                    None => {
                        info!("All workers finished, engine draining");
                        break;
                    }
                },
                _ = regime_interval.tick() => {
                    let now_ms = chrono::Utc::now().timestamp_millis() as u64;
                    self.poll_regime().await;
                    self.gate.cooldowns().prune(now_ms);
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        info!(open_positions = self.exits.open_count(), "Engine stopped");
        Ok(())
    }

    pub async fn handle(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Tick {
                symbol,
                price,
                velocity_1m,
                now_ms,
            } => self.on_tick(&symbol, price, velocity_1m, now_ms).await,
            EngineEvent::Signal { signal, last_price } => {
                let now_ms = signal.detected_at_ms;
                self.evaluate_signal(&signal, last_price, now_ms).await;
            }
        }
    }

    /// Run a signal through the gate; place the entry on approval.
    pub async fn evaluate_signal(
        &mut self,
        signal: &Signal,
        last_price: Option<Price>,
        now_ms: u64,
    ) {
        metrics::SIGNALS_TOTAL
            .with_label_values(&[&signal.direction.to_string(), &signal.tier.to_string()])
            .inc();

        let open = self.exits.open_count();
        let has_position = self.exits.has_position(&signal.symbol);
        let plan = match self
            .gate
            .evaluate(signal, last_price, open, has_position, now_ms)
        {
            Ok(plan) => plan,
            Err(reason) => {
                metrics::GATE_REJECTED_TOTAL
                    .with_label_values(&[&reason.to_string()])
                    .inc();
                debug!(symbol = %signal.symbol, %reason, "signal rejected");
                return;
            }
        };

        match self
            .executor
            .place_entry(
                &plan.symbol,
                plan.direction,
                plan.margin,
                plan.leverage,
                plan.stop_price,
            )
            .await
        {
            Ok(fill) => {
                self.initialize_position(&plan, fill, now_ms).await;
                metrics::ENTRIES_TOTAL
                    .with_label_values(&[&signal.direction.to_string(), &signal.tier.to_string()])
                    .inc();
                metrics::OPEN_POSITIONS.set(self.exits.open_count() as i64);
            }
            Err(e) => warn!(symbol = %plan.symbol, error = %e, "entry placement failed"),
        }
    }

    /// Start tracking a confirmed fill. The tracked stop is anchored to
    /// the fill price; when that differs from the pre-fill stop order,
    /// the stop is re-placed.
    pub async fn initialize_position(&mut self, plan: &TradePlan, fill: EntryFill, now_ms: u64) {
        self.exits.track(
            plan.symbol.clone(),
            plan.direction,
            fill.fill_price,
            plan.margin,
            plan.leverage,
            now_ms,
        );
        if let Some(state) = self.exits.state(&plan.symbol) {
            if state.stop_price != plan.stop_price {
                let stop = state.stop_price;
                if let Err(e) = self.executor.update_stop(&plan.symbol, stop).await {
                    warn!(symbol = %plan.symbol, error = %e, "stop re-anchor failed");
                }
            }
        }
    }

    /// Drive the exit cascade for one symbol at one price.
    pub async fn on_tick(
        &mut self,
        symbol: &Symbol,
        price: Price,
        velocity_1m: Option<Decimal>,
        now_ms: u64,
    ) {
        if let Some(action) = self.exits.on_tick(symbol, price, velocity_1m, now_ms).await {
            self.dispatch_exit(action).await;
        }
    }

    /// Re-read the regime; a flip into CHOPPY flushes the book.
    pub async fn poll_regime(&mut self) {
        let regime = self.regime.regime();
        if regime == Regime::Choppy && self.last_regime != Regime::Choppy {
            warn!(?regime, previous = ?self.last_regime, "regime flipped to CHOPPY");
            self.on_regime_choppy().await;
        }
        self.last_regime = regime;
    }

    /// Close every open position, full size.
    pub async fn on_regime_choppy(&mut self) {
        for action in self.exits.on_regime_choppy() {
            self.dispatch_exit(action).await;
        }
    }

    async fn dispatch_exit(&mut self, action: ExitAction) {
        let kind = match action.kind {
            ExitKind::CloseAll => "all",
            ExitKind::ClosePartial => "partial",
        };
        metrics::EXITS_TOTAL
            .with_label_values(&[&action.reason.to_string(), kind])
            .inc();

        match self
            .executor
            .close_position(&action.symbol, action.close_pct)
            .await
        {
            Ok(()) => {
                if let Some(profit) = action.details.get("profit_pct").and_then(|p| p.to_f64()) {
                    metrics::EXIT_PROFIT_PCT
                        .with_label_values(&[&action.reason.to_string()])
                        .observe(profit);
                }
                match action.kind {
                    ExitKind::CloseAll => self.exits.remove(&action.symbol),
                    ExitKind::ClosePartial => {
                        self.exits.apply_close(&action.symbol, action.close_pct)
                    }
                }
            }
            // The machine's one-shot flags stay latched; the condition
            // re-fires on a later tick if still true.
            Err(e) => warn!(symbol = %action.symbol, error = %e, "close placement failed"),
        }
        metrics::OPEN_POSITIONS.set(self.exits.open_count() as i64);
    }

    pub fn open_positions(&self) -> usize {
        self.exits.open_count()
    }
}
