//! Stock Profile - Quarterly Stock Price Analysis
//!
//! Loads monthly and daily company prices plus a market index from CSV,
//! buckets daily prices into fiscal quarters, prints per-quarter extremes and
//! renders four static charts.

mod charts;
mod config;
mod data;
mod financials;
mod logging;
mod pipeline;
mod stats;

use anyhow::Context;
use config::{AnalysisConfig, CONFIG_FILE};
use std::path::Path;

fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    let config = AnalysisConfig::load(Path::new(CONFIG_FILE))
        .with_context(|| format!("Failed to load {}", CONFIG_FILE))?;

    pipeline::run(&config)
}
