//! Data module - CSV loading, quarter mapping and column normalization

mod loader;
mod processor;
mod quarter;

pub use loader::DataLoader;
pub use processor::{DataProcessor, PRICE_NORMALIZATION};
pub use quarter::{parse_date, QuarterMapper};

/// Trading date column as exported by Yahoo Finance.
pub const DATE_COL: &str = "Date";
/// Close price adjusted for splits and dividends.
pub const ADJ_CLOSE_COL: &str = "Adj Close";
/// Canonical price column after normalization.
pub const PRICE_COL: &str = "Price";
/// Derived fiscal quarter label column.
pub const QUARTER_COL: &str = "Quarter";
