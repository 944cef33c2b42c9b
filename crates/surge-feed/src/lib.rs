//! Market data and order execution contracts for the surge bot.
//!
//! The decision core never performs network I/O itself. Everything it
//! needs from the outside world comes through the traits in this crate:
//!
//! - [`MarketData`]: indicator and price lookups. Every method returns
//!   `Option`; `None` means "unavailable right now" and is treated by
//!   callers as "condition not met", never as an error.
//! - [`OrderExecutor`]: entry/close/stop order placement.
//! - [`RegimeSource`]: externally computed market regime.
//!
//! The crate also owns [`PriceWindow`], the per-instrument rolling buffer
//! that backs all velocity queries.

pub mod error;
pub mod price_window;
pub mod traits;

pub use error::{ExecutorError, ExecutorResult};
pub use price_window::{PriceObservation, PriceWindow, MAX_LOOKBACK_SECS};
pub use traits::{EntryFill, MarketData, OrderExecutor, RegimeSource};

#[cfg(any(test, feature = "test-mocks"))]
pub use traits::MockMarketData;
#[cfg(any(test, feature = "test-mocks"))]
pub use traits::MockOrderExecutor;
