//! Statistics Calculator Module
//! Handles per-quarter aggregation: min/max price reports and descriptive stats.

use crate::data::{PRICE_COL, QUARTER_COL};
use polars::prelude::*;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Missing column: {0}")]
    MissingColumn(String),
    #[error("Row {row} has no quarter label")]
    MissingQuarter { row: usize },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// One row of a per-quarter report.
#[derive(Debug, Clone, PartialEq)]
pub struct QuarterPrice {
    pub quarter: String,
    pub price: f64,
}

/// Highest and lowest price of every quarter, each sorted ascending by price.
#[derive(Debug, Clone, PartialEq)]
pub struct QuarterlyReport {
    pub max: Vec<QuarterPrice>,
    pub min: Vec<QuarterPrice>,
}

impl QuarterlyReport {
    /// Both result sets as (`Quarter`, `Price`) tables for printing.
    pub fn to_dataframes(&self) -> PolarsResult<(DataFrame, DataFrame)> {
        Ok((Self::to_dataframe(&self.max)?, Self::to_dataframe(&self.min)?))
    }

    fn to_dataframe(rows: &[QuarterPrice]) -> PolarsResult<DataFrame> {
        let quarters: Vec<&str> = rows.iter().map(|r| r.quarter.as_str()).collect();
        let prices: Vec<f64> = rows.iter().map(|r| r.price).collect();

        DataFrame::new(vec![
            Column::new(QUARTER_COL.into(), quarters),
            Column::new(PRICE_COL.into(), prices),
        ])
    }
}

/// Descriptive statistics for the prices of one quarter.
#[derive(Debug, Clone)]
pub struct QuarterStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub q1: f64,
    pub q3: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for QuarterStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            q1: f64::NAN,
            q3: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
        }
    }
}

/// Handles statistical calculations over quarter-labelled price tables.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Per-quarter maximum and minimum price.
    ///
    /// Quarters are grouped in ascending label order, then each result set is
    /// stably sorted by price, so equal prices keep label order. Null and NaN
    /// prices are ignored; a quarter without any valid price is omitted.
    pub fn quarterly_extremes(df: &DataFrame) -> Result<QuarterlyReport, ReportError> {
        let mut extremes: BTreeMap<String, (f64, f64)> = BTreeMap::new();

        for (quarter, price) in Self::labelled_prices(df)? {
            extremes
                .entry(quarter)
                .and_modify(|(lo, hi)| {
                    *lo = lo.min(price);
                    *hi = hi.max(price);
                })
                .or_insert((price, price));
        }

        let mut max: Vec<QuarterPrice> = extremes
            .iter()
            .map(|(quarter, &(_, hi))| QuarterPrice {
                quarter: quarter.clone(),
                price: hi,
            })
            .collect();
        let mut min: Vec<QuarterPrice> = extremes
            .into_iter()
            .map(|(quarter, (lo, _))| QuarterPrice { quarter, price: lo })
            .collect();

        max.sort_by(|a, b| a.price.total_cmp(&b.price));
        min.sort_by(|a, b| a.price.total_cmp(&b.price));

        Ok(QuarterlyReport { max, min })
    }

    /// Valid prices grouped by quarter, quarters in order of first appearance.
    pub fn prices_by_quarter(df: &DataFrame) -> Result<Vec<(String, Vec<f64>)>, ReportError> {
        let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (quarter, price) in Self::labelled_prices(df)? {
            let idx = *index.entry(quarter.clone()).or_insert_with(|| {
                groups.push((quarter, Vec::new()));
                groups.len() - 1
            });
            groups[idx].1.push(price);
        }

        Ok(groups)
    }

    /// (quarter, price) pairs with null and NaN prices dropped.
    fn labelled_prices(df: &DataFrame) -> Result<Vec<(String, f64)>, ReportError> {
        let quarters = df
            .column(QUARTER_COL)
            .map_err(|_| ReportError::MissingColumn(QUARTER_COL.to_string()))?
            .cast(&DataType::String)?;
        let quarter_ca = quarters.str()?;

        let prices = df
            .column(PRICE_COL)
            .map_err(|_| ReportError::MissingColumn(PRICE_COL.to_string()))?
            .cast(&DataType::Float64)?;
        let price_ca = prices.f64()?;

        let mut pairs = Vec::with_capacity(df.height());
        for (row, (quarter, price)) in quarter_ca.into_iter().zip(price_ca).enumerate() {
            let quarter = quarter.ok_or(ReportError::MissingQuarter { row })?;
            if let Some(price) = price.filter(|p| !p.is_nan()) {
                pairs.push((quarter.to_string(), price));
            }
        }

        Ok(pairs)
    }

    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(values: &[f64]) -> QuarterStats {
        let n = values.len();
        if n == 0 {
            return QuarterStats::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mean = values.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };

        QuarterStats {
            count: n,
            mean,
            median: Self::percentile(&sorted, 50.0),
            std: variance.sqrt(),
            q1: Self::percentile(&sorted, 25.0),
            q3: Self::percentile(&sorted, 75.0),
            min: sorted[0],
            max: sorted[n - 1],
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }
}
