//! Stats module - Per-quarter aggregation

mod calculator;

pub use calculator::{QuarterlyReport, StatsCalculator};
