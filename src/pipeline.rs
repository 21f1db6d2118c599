//! Analysis pipeline
//! Loader -> quarter mapping -> column normalization -> report and charts.

use crate::charts::{PriceSeries, StaticChartRenderer};
use crate::config::AnalysisConfig;
use crate::data::{DataLoader, DataProcessor, QuarterMapper, PRICE_NORMALIZATION};
use crate::stats::{QuarterlyReport, StatsCalculator};
use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::info;

/// The three tables of a run after quarter mapping and normalization.
pub struct PreparedTables {
    /// Company, monthly
    pub monthly: DataFrame,
    /// Market index, monthly
    pub index: DataFrame,
    /// Company, daily, with a `Quarter` column
    pub quarterly: DataFrame,
}

/// Load the inputs and bring them into analysis shape.
pub fn prepare(config: &AnalysisConfig) -> Result<PreparedTables> {
    let loader = DataLoader::new(&config.data_dir);

    let monthly = load_and_preview(&loader, &config.monthly_csv, config.preview_rows)?;
    let index = load_and_preview(&loader, &config.index_csv, config.preview_rows)?;
    let daily = load_and_preview(&loader, &config.daily_csv, config.preview_rows)?;

    let quarterly = QuarterMapper::with_quarter(daily)
        .with_context(|| format!("Failed to derive quarters for {}", config.daily_csv))?;
    info!(rows = quarterly.height(), "Mapped daily rows to quarters");

    let normalize = |df: DataFrame, name: &str| {
        DataProcessor::normalize_columns(df, &PRICE_NORMALIZATION)
            .with_context(|| format!("Failed to normalize columns of {}", name))
    };
    let monthly = normalize(monthly, &config.monthly_csv)?;
    let index = normalize(index, &config.index_csv)?;
    let quarterly = normalize(quarterly, &config.daily_csv)?;

    println!("{}", DataLoader::preview(&monthly, config.preview_rows));
    println!("{}", DataLoader::preview(&index, config.preview_rows));
    println!("{}", DataLoader::preview(&quarterly, config.preview_rows));

    Ok(PreparedTables {
        monthly,
        index,
        quarterly,
    })
}

/// Run the whole analysis: print the summaries and write the four charts.
pub fn run(config: &AnalysisConfig) -> Result<()> {
    let tables = prepare(config)?;

    let report = StatsCalculator::quarterly_extremes(&tables.quarterly)
        .context("Failed to aggregate quarterly prices")?;
    print_report(&report)?;

    print_margins(config);

    let renderer =
        StaticChartRenderer::new(&config.output_dir, config.chart_width, config.chart_height);

    let groups = StatsCalculator::prices_by_quarter(&tables.quarterly)
        .context("Failed to group prices by quarter")?;
    renderer.render_price_distribution(&groups)?;
    renderer.render_eps(&config.financials.eps)?;
    renderer.render_earnings_revenue(&config.financials.results)?;

    let company = PriceSeries::from_table(&config.company_name, &tables.monthly)
        .with_context(|| format!("Failed to read prices of {}", config.monthly_csv))?;
    let market = PriceSeries::from_table(&config.index_name, &tables.index)
        .with_context(|| format!("Failed to read prices of {}", config.index_csv))?;
    renderer.render_comparison(&company, &market)?;

    info!(output_dir = %config.output_dir.display(), "Analysis complete");
    Ok(())
}

fn load_and_preview(loader: &DataLoader, file_name: &str, rows: usize) -> Result<DataFrame> {
    let df = loader
        .load_csv(file_name)
        .with_context(|| format!("Failed to load {}", file_name))?;
    println!("{}", DataLoader::preview(&df, rows));
    Ok(df)
}

fn print_report(report: &QuarterlyReport) -> Result<()> {
    let (max_df, min_df) = report.to_dataframes()?;
    println!("Highest price per quarter:\n{}", max_df);
    println!("Lowest price per quarter:\n{}", min_df);

    if let (Some(high), Some(low)) = (report.max.last(), report.min.first()) {
        println!(
            "The highest price was in {} at {:.2} and the lowest in {} at {:.2}.",
            high.quarter, high.price, low.quarter, low.price
        );
    }
    Ok(())
}

fn print_margins(config: &AnalysisConfig) {
    for (label, margin) in config.financials.earnings_margins() {
        println!("{}: earnings were {:.2}% of revenue", label, margin);
    }
}
