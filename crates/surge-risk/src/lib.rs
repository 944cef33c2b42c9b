//! Pre-trade gates and sizing for the surge bot.
//!
//! Every approved signal passes through [`TradeGate::evaluate`] before an
//! order is placed. The gate enforces the one-position-per-symbol rule,
//! per-symbol cooldowns, regime direction filters, and the portfolio
//! capacity cap, then sizes the trade (margin, leverage, initial stop).
//!
//! - [`RejectReason`]: why a signal was turned away.
//! - [`CooldownRegistry`]: per-symbol re-entry delay keyed by signal tier.
//! - [`TradePlan`]: the sized order an approved signal becomes.

pub mod config;
pub mod cooldown;
pub mod gate;
pub mod reject;

pub use config::GateConfig;
pub use cooldown::CooldownRegistry;
pub use gate::{TradeGate, TradePlan};
pub use reject::RejectReason;
