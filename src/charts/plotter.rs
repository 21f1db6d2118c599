//! Chart Plotter Module
//! Prepares plot geometry: violin outlines, grouped bar positions, axis ranges
//! and the price series drawn by the comparison chart.

use crate::data::{parse_date, DATE_COL, PRICE_COL};
use crate::stats::StatsCalculator;
use chrono::Datelike;
use polars::prelude::*;
use statrs::distribution::{Continuous, Normal};

/// Density is evaluated this many bandwidths beyond the extreme values.
const KDE_CUT: f64 = 2.0;

/// Dated prices of one table, nulls and NaN removed.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    pub name: String,
    pub dates: Vec<String>,
    pub prices: Vec<f64>,
}

impl PriceSeries {
    pub fn from_table(name: &str, df: &DataFrame) -> PolarsResult<Self> {
        let dates = df.column(DATE_COL)?.cast(&DataType::String)?;
        let prices = df.column(PRICE_COL)?.cast(&DataType::Float64)?;

        let mut series = Self {
            name: name.to_string(),
            dates: Vec::with_capacity(df.height()),
            prices: Vec::with_capacity(df.height()),
        };
        for (date, price) in dates.str()?.into_iter().zip(prices.f64()?) {
            if let (Some(date), Some(price)) = (date, price) {
                if !price.is_nan() {
                    series.dates.push(date.to_string());
                    series.prices.push(price);
                }
            }
        }

        Ok(series)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Two-digit month of the row at `idx`, empty if the date doesn't parse.
    pub fn month_label(&self, idx: usize) -> String {
        self.dates
            .get(idx)
            .and_then(|d| parse_date(d))
            .map(|d| format!("{:02}", d.month()))
            .unwrap_or_default()
    }

    /// Distinct years covered, in order, e.g. "2018   2019".
    pub fn year_caption(&self) -> String {
        let mut years: Vec<i32> = Vec::new();
        for year in self.dates.iter().filter_map(|d| parse_date(d)).map(|d| d.year()) {
            if years.last() != Some(&year) {
                years.push(year);
            }
        }
        years
            .iter()
            .map(|y| y.to_string())
            .collect::<Vec<_>>()
            .join("   ")
    }
}

/// Pure geometry helpers for the static charts.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Gaussian kernel density outline of `values`.
    ///
    /// Returns `points` pairs of (value, density) with the density scaled so
    /// its peak is 1.0. Bandwidth follows Scott's rule.
    pub fn violin_outline(values: &[f64], points: usize) -> Vec<(f64, f64)> {
        let stats = StatsCalculator::compute_descriptive_stats(values);
        if stats.count == 0 || points < 2 {
            return Vec::new();
        }
        let Ok(kernel) = Normal::new(0.0, 1.0) else {
            return Vec::new();
        };

        let n = stats.count as f64;
        let mut bandwidth = stats.std * n.powf(-0.2);
        if bandwidth.is_nan() || bandwidth <= 0.0 {
            // Single value or all equal
            bandwidth = (stats.mean.abs() * 1e-3).max(1e-3);
        }

        let lo = stats.min - KDE_CUT * bandwidth;
        let hi = stats.max + KDE_CUT * bandwidth;
        let step = (hi - lo) / (points - 1) as f64;

        let mut outline: Vec<(f64, f64)> = (0..points)
            .map(|i| {
                let y = lo + step * i as f64;
                let density = values
                    .iter()
                    .map(|v| kernel.pdf((y - v) / bandwidth))
                    .sum::<f64>()
                    / (n * bandwidth);
                (y, density)
            })
            .collect();

        let peak = outline.iter().map(|&(_, d)| d).fold(0.0, f64::max);
        if peak > 0.0 {
            for (_, d) in outline.iter_mut() {
                *d /= peak;
            }
        }
        outline
    }

    /// X positions of one dataset in a side-by-side bar chart.
    ///
    /// `dataset` is 1-based, `datasets` the number of bars per set, `sets` the
    /// number of groups and `width` the bar width.
    pub fn bar_positions(dataset: usize, datasets: usize, sets: usize, width: f64) -> Vec<f64> {
        (0..sets)
            .map(|i| (datasets * i) as f64 + width * dataset as f64)
            .collect()
    }

    /// Pairwise midpoints, where group labels go.
    pub fn midpoints(a: &[f64], b: &[f64]) -> Vec<f64> {
        a.iter().zip(b).map(|(x, y)| (x + y) / 2.0).collect()
    }

    /// Min/max of `values` widened by `pad` of the span on both sides.
    pub fn value_range(values: impl IntoIterator<Item = f64>, pad: f64) -> (f64, f64) {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values {
            if !v.is_nan() {
                min = min.min(v);
                max = max.max(v);
            }
        }
        if min.is_infinite() {
            return (0.0, 1.0);
        }
        let span = if max > min { max - min } else { min.abs().max(1.0) };
        (min - span * pad, max + span * pad)
    }

    /// Label of the category whose tick sits at `x`, empty between ticks.
    pub fn tick_label(ticks: &[f64], labels: &[String], x: f64) -> String {
        ticks
            .iter()
            .position(|t| (t - x).abs() < 1e-6)
            .and_then(|i| labels.get(i).cloned())
            .unwrap_or_default()
    }
}
