//! Data Processor Module
//! Handles column normalization across price tables.

use super::{ADJ_CLOSE_COL, PRICE_COL};
use polars::prelude::*;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Cannot rename '{from}' to '{to}': column '{to}' already exists")]
    SchemaConflict { from: String, to: String },
}

/// Rename applied to every price table: `Adj Close` becomes `Price`.
pub const PRICE_NORMALIZATION: [(&str, &str); 1] = [(ADJ_CLOSE_COL, PRICE_COL)];

/// Handles schema normalization operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Rename every column listed in `mapping` (old name, canonical name).
    ///
    /// Old names absent from the table are skipped, so the same mapping can be
    /// applied to tables with different schemas. Renaming onto a column that
    /// already exists fails with [`ProcessorError::SchemaConflict`].
    pub fn normalize_columns(
        mut df: DataFrame,
        mapping: &[(&str, &str)],
    ) -> Result<DataFrame, ProcessorError> {
        for &(from, to) in mapping {
            if from == to || !Self::has_column(&df, from) {
                continue;
            }
            if Self::has_column(&df, to) {
                return Err(ProcessorError::SchemaConflict {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }

            df.rename(from, to.into())?;
            debug!(from, to, "Renamed column");
        }

        Ok(df)
    }

    /// Check whether a column is part of the table's schema.
    pub fn has_column(df: &DataFrame, name: &str) -> bool {
        df.get_column_index(name).is_some()
    }
}
