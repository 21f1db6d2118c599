//! Charts module - Static chart rendering

mod plotter;
mod renderer;

pub use plotter::{ChartPlotter, PriceSeries};
pub use renderer::{ChartError, StaticChartRenderer};
