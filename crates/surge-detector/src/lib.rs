//! Tiered velocity signal classifier.
//!
//! Classifies live price streams into tiered entry signals using a
//! strict priority cascade:
//!
//! 1. Tier 1 (instant): raw 5m velocity, bypasses all gate checks
//! 2. Tier 2 (fast): 5m velocity plus volume confirmation
//! 3. Momentum stack: same-direction velocity across 1h/15m/5m
//! 4. Tier 3 (micro): 1m velocity plus consecutive candles
//! 5. Legacy: six independent boolean checks with a score threshold
//!
//! On the short side a moondrop cascade (candle wick/body/range shape)
//! runs before everything else.
//!
//! The first matching branch wins; at most one signal is emitted per
//! instrument per scan.

pub mod classifier;
pub mod config;
pub mod moondrop;
pub mod oi_tracker;
pub mod signal;

pub use classifier::TierClassifier;
pub use config::{DetectorConfig, LegacyConfig, MomentumConfig, MoondropConfig, TierConfig};
pub use moondrop::MoondropIndicators;
pub use oi_tracker::OiTracker;
pub use signal::Signal;
