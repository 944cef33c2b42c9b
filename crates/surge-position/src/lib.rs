//! Position lifecycle: entry stop placement and the exit state machine.
//!
//! Exit conditions are evaluated per tick in a fixed priority order, the
//! first match wins:
//!
//! 1. hard stop-loss
//! 2. velocity reversal (pump-and-dump protection)
//! 3. instant pump lock-in
//! 4. funding-rate exit
//! 5. staged take-profit
//! 6. tiered trailing stop
//! 7. max hold timeout
//!
//! A regime flip into CHOPPY liquidates every open position outside the
//! per-tick cascade.

pub mod config;
pub mod machine;
pub mod state;
pub mod stop;

pub use config::{
    ExitConfig, FundingExitConfig, InstantPumpConfig, StopConfig, TakeProfitLevel, TpEffect,
    TrailingBand, TrailingConfig, VelocityExitConfig,
};
pub use machine::{ExitAction, ExitKind, ExitReason, ExitStateMachine};
pub use state::PositionState;
pub use stop::initial_stop;
