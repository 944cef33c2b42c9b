//! Surge moonshot bot application.
//!
//! Wires the decision core together:
//! - Per-symbol workers owning a `PriceWindow` and a `TierClassifier`
//! - Engine task serializing gate decisions and the position book
//! - Replay feed and paper executor for offline runs

pub mod config;
pub mod engine;
pub mod error;
pub mod replay;
pub mod worker;

pub use config::AppConfig;
pub use engine::{Engine, EngineEvent};
pub use error::{AppError, AppResult};
pub use replay::{PaperExecutor, ReplayFeed, ReplayRecord, StaticRegime};
pub use worker::SymbolWorker;
