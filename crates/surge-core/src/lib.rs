//! Core domain types for the surge trading bot.
//!
//! This crate provides fundamental types used throughout the system:
//! - `Symbol`: Instrument identifier (e.g., "DOGEUSDT")
//! - `Price`: Precision-safe price type
//! - `Direction`, `Tier`, `Regime`: Trading enums
//! - `Candle`: OHLCV bar used by candle-shape checks

pub mod candle;
pub mod decimal;
pub mod symbol;
pub mod types;

pub use candle::{Candle, CandleInterval};
pub use decimal::Price;
pub use symbol::Symbol;
pub use types::{Direction, Regime, Tier};
