//! Static Chart Renderer
//! Draws the four PNG charts of a stock profile with plotters.
//!
//! 1. Price distribution by quarter (violin plot with inner quartile box)
//! 2. Earnings per share, actual vs. estimate (scatter)
//! 3. Earnings and revenue per quarter (side-by-side bars)
//! 4. Company vs. market index prices (two line panels)

use crate::charts::{ChartPlotter, PriceSeries};
use crate::financials::{EpsPoint, QuarterResult};
use crate::stats::StatsCalculator;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fs;
use std::iter;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const DISTRIBUTION_CHART: &str = "Stock_Prices_by_Quarter.png";
pub const EPS_CHART: &str = "earnings_per_share.png";
pub const EARNINGS_REVENUE_CHART: &str = "earnings_revenue.png";
pub const COMPARISON_CHART: &str = "spotify_downjones.png";

// Seaborn "pastel" palette
const PASTEL: [RGBColor; 10] = [
    RGBColor(161, 201, 244),
    RGBColor(255, 180, 130),
    RGBColor(141, 229, 161),
    RGBColor(255, 159, 155),
    RGBColor(208, 187, 255),
    RGBColor(222, 187, 155),
    RGBColor(250, 176, 228),
    RGBColor(207, 207, 207),
    RGBColor(255, 254, 163),
    RGBColor(185, 242, 240),
];
const REVENUE_COLOR: RGBColor = RGBColor(31, 119, 180);
const EARNINGS_COLOR: RGBColor = RGBColor(255, 127, 14);
const MEDIUM_SEA_GREEN: RGBColor = RGBColor(60, 179, 113);
const DODGER_BLUE: RGBColor = RGBColor(30, 144, 255);
const GRID_GRAY: RGBColor = RGBColor(220, 220, 220);

const FONT: &str = "sans-serif";
const VIOLIN_POINTS: usize = 100;
const VIOLIN_HALF_WIDTH: f64 = 0.4;
const BAR_WIDTH: f64 = 0.8;
const SCATTER_ALPHA: f64 = 0.5;

type DrawResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("No data to plot for {0}")]
    NoData(&'static str),
    #[error("Failed to create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to render {}: {message}", file.display())]
    Render { file: PathBuf, message: String },
}

/// Writes chart images into one output directory.
pub struct StaticChartRenderer {
    output_dir: PathBuf,
    size: (u32, u32),
}

impl StaticChartRenderer {
    pub fn new(output_dir: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            output_dir: output_dir.into(),
            size: (width, height),
        }
    }

    /// Violin plot of prices per quarter, quarters left to right in the
    /// order given.
    pub fn render_price_distribution(
        &self,
        groups: &[(String, Vec<f64>)],
    ) -> Result<PathBuf, ChartError> {
        if groups.iter().all(|(_, values)| values.is_empty()) {
            return Err(ChartError::NoData("price distribution"));
        }
        self.render(DISTRIBUTION_CHART, |path| {
            Self::draw_price_distribution(path, self.size, groups)
        })
    }

    /// Scatter of actual vs. estimated earnings per share.
    pub fn render_eps(&self, eps: &[EpsPoint]) -> Result<PathBuf, ChartError> {
        if eps.is_empty() {
            return Err(ChartError::NoData("earnings per share"));
        }
        self.render(EPS_CHART, |path| Self::draw_eps(path, self.size, eps))
    }

    /// Revenue and earnings bars side by side for every quarter.
    pub fn render_earnings_revenue(&self, results: &[QuarterResult]) -> Result<PathBuf, ChartError> {
        if results.is_empty() {
            return Err(ChartError::NoData("earnings and revenue"));
        }
        self.render(EARNINGS_REVENUE_CHART, |path| {
            Self::draw_earnings_revenue(path, self.size, results)
        })
    }

    /// Company and index prices in two panels side by side.
    pub fn render_comparison(
        &self,
        company: &PriceSeries,
        index: &PriceSeries,
    ) -> Result<PathBuf, ChartError> {
        if company.is_empty() || index.is_empty() {
            return Err(ChartError::NoData("price comparison"));
        }
        self.render(COMPARISON_CHART, |path| {
            Self::draw_comparison(path, self.size, company, index)
        })
    }

    fn render(
        &self,
        file: &str,
        draw: impl FnOnce(&Path) -> DrawResult,
    ) -> Result<PathBuf, ChartError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| ChartError::OutputDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let path = self.output_dir.join(file);
        draw(&path).map_err(|e| ChartError::Render {
            file: path.clone(),
            message: e.to_string(),
        })?;

        info!(path = %path.display(), "Rendered chart");
        Ok(path)
    }

    fn draw_price_distribution(
        path: &Path,
        size: (u32, u32),
        groups: &[(String, Vec<f64>)],
    ) -> DrawResult {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;

        let outlines: Vec<Vec<(f64, f64)>> = groups
            .iter()
            .map(|(_, values)| ChartPlotter::violin_outline(values, VIOLIN_POINTS))
            .collect();
        let (y_min, y_max) =
            ChartPlotter::value_range(outlines.iter().flatten().map(|&(y, _)| y), 0.05);

        let ticks: Vec<f64> = (0..groups.len()).map(|i| i as f64).collect();
        let labels: Vec<String> = groups.iter().map(|(q, _)| q.clone()).collect();
        let x_formatter = |x: &f64| ChartPlotter::tick_label(&ticks, &labels, *x);

        let mut chart = ChartBuilder::on(&root)
            .caption(
                "Distribution of 2018/2019 Spotify Stock Prices by Quarter",
                (FONT, 22).into_font(),
            )
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(-0.5f64..groups.len() as f64 - 0.5, y_min..y_max)?;

        // One tick per quarter, on the violin centers
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(groups.len())
            .light_line_style(&WHITE)
            .bold_line_style(&GRID_GRAY)
            .x_label_formatter(&x_formatter)
            .x_desc("Business Quarters in 2018/2019")
            .y_desc("Closing Stock Price (USD)")
            .draw()?;

        for (i, ((_, values), outline)) in groups.iter().zip(&outlines).enumerate() {
            if outline.is_empty() {
                continue;
            }
            let center = i as f64;
            let color = PASTEL[i % PASTEL.len()];

            let mut shape: Vec<(f64, f64)> = outline
                .iter()
                .map(|&(y, d)| (center - d * VIOLIN_HALF_WIDTH, y))
                .collect();
            shape.extend(
                outline
                    .iter()
                    .rev()
                    .map(|&(y, d)| (center + d * VIOLIN_HALF_WIDTH, y)),
            );
            let mut border = shape.clone();
            border.push(shape[0]);

            chart.draw_series(iter::once(Polygon::new(shape, color.filled())))?;
            chart.draw_series(iter::once(PathElement::new(border, BLACK.stroke_width(1))))?;

            // Inner box: whiskers to the extremes, thick bar over the IQR,
            // white dot on the median
            let stats = StatsCalculator::compute_descriptive_stats(values);
            chart.draw_series(iter::once(PathElement::new(
                vec![(center, stats.min), (center, stats.max)],
                BLACK.stroke_width(1),
            )))?;
            chart.draw_series(iter::once(Rectangle::new(
                [(center - 0.03, stats.q1), (center + 0.03, stats.q3)],
                BLACK.filled(),
            )))?;
            chart.draw_series(iter::once(Circle::new(
                (center, stats.median),
                3,
                WHITE.filled(),
            )))?;
        }

        root.present()?;
        Ok(())
    }

    fn draw_eps(path: &Path, size: (u32, u32), eps: &[EpsPoint]) -> DrawResult {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;

        let (y_min, y_max) = ChartPlotter::value_range(
            eps.iter().flat_map(|p| [p.actual, p.estimate]),
            0.15,
        );
        let ticks: Vec<f64> = (1..=eps.len()).map(|i| i as f64).collect();
        let labels: Vec<String> = eps.iter().map(|p| p.label.clone()).collect();
        let x_formatter = |x: &f64| ChartPlotter::tick_label(&ticks, &labels, *x);

        let mut chart = ChartBuilder::on(&root)
            .caption("Earnings Per Share in Cents", (FONT, 22).into_font())
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0.5f64..eps.len() as f64 + 0.5, y_min..y_max)?;

        chart
            .configure_mesh()
            .x_labels(eps.len())
            .light_line_style(&WHITE)
            .bold_line_style(&GRID_GRAY)
            .x_label_formatter(&x_formatter)
            .draw()?;

        let actual = RED.mix(SCATTER_ALPHA);
        let estimate = BLUE.mix(SCATTER_ALPHA);

        chart
            .draw_series(
                eps.iter()
                    .enumerate()
                    .map(|(i, p)| Circle::new(((i + 1) as f64, p.actual), 7, actual.filled())),
            )?
            .label("Actual")
            .legend(move |(x, y)| Circle::new((x + 10, y), 5, actual.filled()));
        chart
            .draw_series(
                eps.iter()
                    .enumerate()
                    .map(|(i, p)| Circle::new(((i + 1) as f64, p.estimate), 7, estimate.filled())),
            )?
            .label("Estimate")
            .legend(move |(x, y)| Circle::new((x + 10, y), 5, estimate.filled()));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }

    fn draw_earnings_revenue(path: &Path, size: (u32, u32), results: &[QuarterResult]) -> DrawResult {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;

        // Shift the axis so the pair midpoints sit on even numbers
        let revenue_x = ChartPlotter::bar_positions(1, 2, results.len(), BAR_WIDTH);
        let earnings_x = ChartPlotter::bar_positions(2, 2, results.len(), BAR_WIDTH);
        let offset = ChartPlotter::midpoints(&revenue_x, &earnings_x)
            .first()
            .copied()
            .unwrap_or(0.0);
        let revenue_x: Vec<f64> = revenue_x.iter().map(|x| x - offset).collect();
        let earnings_x: Vec<f64> = earnings_x.iter().map(|x| x - offset).collect();
        let middle_x = ChartPlotter::midpoints(&revenue_x, &earnings_x);

        let (y_min, y_max) = ChartPlotter::value_range(
            results
                .iter()
                .flat_map(|r| [r.revenue, r.earnings])
                .chain(iter::once(0.0)),
            0.1,
        );
        let x_min = revenue_x.first().copied().unwrap_or(0.0) - BAR_WIDTH;
        let x_max = earnings_x.last().copied().unwrap_or(0.0) + BAR_WIDTH;
        let labels: Vec<String> = results.iter().map(|r| r.label.clone()).collect();
        let x_formatter = |x: &f64| ChartPlotter::tick_label(&middle_x, &labels, *x);

        let mut chart = ChartBuilder::on(&root)
            .caption("Earnings and Revenue in billions", (FONT, 22).into_font())
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .x_labels(results.len())
            .light_line_style(&WHITE)
            .bold_line_style(&GRID_GRAY)
            .x_label_formatter(&x_formatter)
            .y_label_formatter(&|y: &f64| format!("{:.1}", y))
            .draw()?;

        let half = BAR_WIDTH / 2.0;
        chart
            .draw_series(revenue_x.iter().zip(results).map(|(&x, r)| {
                Rectangle::new([(x - half, 0.0), (x + half, r.revenue)], REVENUE_COLOR.filled())
            }))?
            .label("Revenue")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], REVENUE_COLOR.filled()));
        chart
            .draw_series(earnings_x.iter().zip(results).map(|(&x, r)| {
                Rectangle::new([(x - half, 0.0), (x + half, r.earnings)], EARNINGS_COLOR.filled())
            }))?
            .label("Earnings")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], EARNINGS_COLOR.filled()));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }

    fn draw_comparison(
        path: &Path,
        size: (u32, u32),
        company: &PriceSeries,
        index: &PriceSeries,
    ) -> DrawResult {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;

        let panels = root.split_evenly((1, 2));
        Self::draw_price_panel(&panels[0], company, MEDIUM_SEA_GREEN)?;
        Self::draw_price_panel(&panels[1], index, DODGER_BLUE)?;

        root.present()?;
        Ok(())
    }

    fn draw_price_panel(
        area: &DrawingArea<BitMapBackend<'_>, Shift>,
        series: &PriceSeries,
        color: RGBColor,
    ) -> DrawResult {
        // Tick on every second row, labelled with its month
        let ticks: Vec<f64> = (0..series.len()).step_by(2).map(|i| i as f64).collect();
        let labels: Vec<String> = (0..series.len())
            .step_by(2)
            .map(|i| series.month_label(i))
            .collect();
        let x_formatter = |x: &f64| ChartPlotter::tick_label(&ticks, &labels, *x);
        let (y_min, y_max) = ChartPlotter::value_range(series.prices.iter().copied(), 0.05);
        let x_max = series.len().saturating_sub(1).max(1) as f64;

        let mut chart = ChartBuilder::on(area)
            .caption(&series.name, (FONT, 20).into_font())
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d(0f64..x_max, y_min..y_max)?;

        chart
            .configure_mesh()
            .x_labels(ticks.len())
            .light_line_style(&WHITE)
            .bold_line_style(&GRID_GRAY)
            .x_label_formatter(&x_formatter)
            .x_desc(series.year_caption())
            .y_desc("Stock Price")
            .draw()?;

        chart.draw_series(LineSeries::new(
            series
                .prices
                .iter()
                .enumerate()
                .map(|(i, &p)| (i as f64, p)),
            color.stroke_width(2),
        ))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::financials::Financials;

    #[test]
    fn test_empty_inputs_are_rejected_before_drawing() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = StaticChartRenderer::new(dir.path(), 800, 600);

        assert!(matches!(
            renderer.render_price_distribution(&[("Q2-2018".to_string(), Vec::new())]),
            Err(ChartError::NoData(_))
        ));
        assert!(matches!(renderer.render_eps(&[]), Err(ChartError::NoData(_))));
        assert!(matches!(
            renderer.render_earnings_revenue(&[]),
            Err(ChartError::NoData(_))
        ));

        let empty = PriceSeries {
            name: "Dow Jones".to_string(),
            dates: Vec::new(),
            prices: Vec::new(),
        };
        assert!(matches!(
            renderer.render_comparison(&empty, &empty),
            Err(ChartError::NoData(_))
        ));

        // Nothing was written
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    /// Text rendering needs a system font; CI images without one skip the
    /// drawing tests.
    fn font_available() -> bool {
        let mut buffer = vec![0u8; 120 * 40 * 3];
        let area = BitMapBackend::with_buffer(&mut buffer, (120, 40)).into_drawing_area();
        area.draw(&Text::new("Q3-2018", (5, 5), (FONT, 14).into_font()))
            .is_ok()
    }

    fn series(name: &str, prices: &[f64]) -> PriceSeries {
        PriceSeries {
            name: name.to_string(),
            dates: (0..prices.len())
                .map(|i| format!("2018-{:02}-01", i % 12 + 1))
                .collect(),
            prices: prices.to_vec(),
        }
    }

    fn assert_png(path: &Path) {
        let bytes = std::fs::read(path).unwrap();
        assert!(bytes.len() > 8, "{} is empty", path.display());
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_renders_all_four_charts() {
        if !font_available() {
            eprintln!("no system font found, skipping chart rendering");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let renderer = StaticChartRenderer::new(dir.path().join("charts"), 800, 600);
        let financials = Financials::default();

        let groups = vec![
            ("Q2-2018".to_string(), vec![148.0, 160.5, 169.0, 155.2]),
            ("Q3-2018".to_string(), vec![172.0, 196.28, 180.1]),
            ("Q4-2018".to_string(), vec![106.84]),
            ("Q1-2019".to_string(), vec![120.0, 120.0, 120.0]),
        ];
        let company = series("Spotify", &[150.0, 155.0, 170.0, 181.0, 160.0, 145.0, 130.0]);
        let market = series("Dow Jones", &[24163.0, 24415.0, 24271.0, 25415.0, 25964.0]);

        let written = [
            renderer.render_price_distribution(&groups).unwrap(),
            renderer.render_eps(&financials.eps).unwrap(),
            renderer.render_earnings_revenue(&financials.results).unwrap(),
            renderer.render_comparison(&company, &market).unwrap(),
        ];

        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![DISTRIBUTION_CHART, EPS_CHART, EARNINGS_REVENUE_CHART, COMPARISON_CHART]
        );
        for path in &written {
            assert!(path.starts_with(dir.path().join("charts")));
            assert_png(path);
        }
    }
}
