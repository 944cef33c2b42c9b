//! Prometheus metrics for the surge bot.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration fails,
//! it indicates a fatal configuration error (e.g., duplicate metric names)
//! that should cause an immediate crash at startup rather than silent failure.
//! These panics only occur during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_gauge, CounterVec, HistogramVec,
    IntGauge,
};

/// Total signals emitted by the classifier.
/// Labels: direction (long/short), tier (1/2/3/legacy)
pub static SIGNALS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "surge_signals_total",
        "Total surge signals emitted",
        &["direction", "tier"]
    )
    .unwrap()
});

/// Total signals rejected at the pre-trade gate.
pub static GATE_REJECTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "surge_gate_rejected_total",
        "Total signals rejected at the pre-trade gate",
        &["reason"]
    )
    .unwrap()
});

/// Total entries placed.
pub static ENTRIES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "surge_entries_total",
        "Total position entries placed",
        &["direction", "tier"]
    )
    .unwrap()
});

/// Total exit actions, full and partial.
pub static EXITS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "surge_exits_total",
        "Total exit actions emitted",
        &["reason", "kind"]
    )
    .unwrap()
});

/// Currently open positions.
pub static OPEN_POSITIONS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("surge_open_positions", "Currently open positions").unwrap()
});

/// Realized profit distribution per closed position, percent on margin.
pub static EXIT_PROFIT_PCT: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "surge_exit_profit_pct",
        "Profit percent at exit",
        &["reason"],
        vec![-10.0, -5.0, -2.0, 0.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0]
    )
    .unwrap()
});
