//! Surge moonshot bot entry point.
//!
//! Replays a recorded tick file through the full decision core with a
//! paper executor. Live exchange connectivity plugs in behind the
//! `MarketData`/`OrderExecutor` traits and is not part of this binary.

use anyhow::Result;
use clap::Parser;
use std::collections::HashMap;
use std::io::BufRead;
use std::sync::Arc;
use surge_bot::{AppConfig, Engine, PaperExecutor, ReplayFeed, ReplayRecord, StaticRegime, SymbolWorker};
use surge_core::Symbol;
use surge_feed::PriceObservation;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Surge moonshot bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via SURGE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Tick file to replay (JSON lines: timestamp_ms, symbol, price, volume)
    #[arg(short, long)]
    replay: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    surge_telemetry::init_logging()?;
    info!("Starting surge bot v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load(args.config)?;
    config.validate()?;
    info!(symbols = ?config.symbols, regime = ?config.static_regime, "Configuration loaded");

    let feed = Arc::new(ReplayFeed::new());
    let executor = Arc::new(PaperExecutor::new(feed.clone()));
    let regime = Arc::new(StaticRegime(config.static_regime));

    let (event_tx, event_rx) = mpsc::channel(config.event_queue_capacity);
    let mut tick_txs: HashMap<Symbol, mpsc::Sender<PriceObservation>> = HashMap::new();
    let mut worker_handles = Vec::new();

    for name in &config.symbols {
        let symbol = Symbol::from(name.clone());
        let (tick_tx, tick_rx) = mpsc::channel(config.tick_queue_capacity);
        let worker = SymbolWorker::new(
            symbol.clone(),
            config.detector.clone(),
            feed.clone(),
            event_tx.clone(),
        );
        worker_handles.push(tokio::spawn(worker.run(tick_rx)));
        tick_txs.insert(symbol, tick_tx);
    }
    drop(event_tx);

    let engine = Engine::new(&config, feed.clone(), executor, regime);
    let engine_handle = tokio::spawn(engine.run(event_rx));

    info!(path = %args.replay, "Replaying ticks");
    let file = std::fs::File::open(&args.replay)?;
    let mut replayed = 0u64;
    let mut skipped = 0u64;
    for line in std::io::BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: ReplayRecord = serde_json::from_str(&line)?;
        let symbol = Symbol::from(record.symbol.clone());
        let Some(tick_tx) = tick_txs.get(&symbol) else {
            skipped += 1;
            continue;
        };
        let obs = record.observation();
        feed.record(&symbol, obs);
        if tick_tx.send(obs).await.is_err() {
            warn!(%symbol, "worker gone, stopping replay");
            break;
        }
        replayed += 1;
    }
    info!(replayed, skipped, "Replay finished");

    // Workers drain their queues and exit once the senders drop; the
    // engine stops when the last worker hangs up.
    drop(tick_txs);
    for handle in worker_handles {
        let _ = handle.await;
    }
    engine_handle.await??;

    Ok(())
}
