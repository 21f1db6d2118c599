//! CSV Data Loader Module
//! Handles CSV file loading and column inspection using Polars.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("CSV file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
}

/// Loads the price tables of one analysis run from a data directory.
pub struct DataLoader {
    data_dir: PathBuf,
}

impl DataLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Resolve a file name against the data directory.
    pub fn resolve(&self, file_name: &str) -> PathBuf {
        self.data_dir.join(file_name)
    }

    /// Load a CSV file from the data directory using Polars.
    pub fn load_csv(&self, file_name: &str) -> Result<DataFrame, LoaderError> {
        let path = self.resolve(file_name);
        Self::load_path(&path)
    }

    /// Load a CSV file from an explicit path.
    pub fn load_path(path: &Path) -> Result<DataFrame, LoaderError> {
        if !path.is_file() {
            return Err(LoaderError::NotFound(path.to_path_buf()));
        }

        // Use lazy evaluation for memory efficiency, then collect
        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            "Loaded CSV"
        );
        debug!(columns = ?Self::get_columns(&df), "CSV schema");

        Ok(df)
    }

    /// Get list of column names of a table.
    pub fn get_columns(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// First `n` rows of a table, for console inspection.
    pub fn preview(df: &DataFrame, n: usize) -> DataFrame {
        df.head(Some(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SAMPLE: &str = "Date,Open,High,Low,Close,Adj Close,Volume\n\
        2018-04-03,148.00,169.00,131.00,149.01,149.01,30526500\n\
        2018-04-04,144.00,147.27,138.37,144.22,144.22,6839300\n\
        2018-04-05,147.74,151.95,145.63,148.86,148.86,4289900\n";

    #[test]
    fn test_load_csv_reads_all_rows_and_columns() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("SPOT_daily.csv"), SAMPLE).unwrap();

        let loader = DataLoader::new(dir.path());
        let df = loader.load_csv("SPOT_daily.csv").unwrap();

        assert_eq!(df.height(), 3);
        assert_eq!(
            DataLoader::get_columns(&df),
            vec!["Date", "Open", "High", "Low", "Close", "Adj Close", "Volume"]
        );
    }

    #[test]
    fn test_missing_file_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DataLoader::new(dir.path());

        match loader.load_csv("DJI.csv") {
            Err(LoaderError::NotFound(path)) => assert!(path.ends_with("DJI.csv")),
            other => panic!("expected NotFound, got {:?}", other.map(|df| df.height())),
        }
    }

    #[test]
    fn test_preview_limits_rows() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("SPOT_daily.csv"), SAMPLE).unwrap();

        let df = DataLoader::new(dir.path()).load_csv("SPOT_daily.csv").unwrap();
        assert_eq!(DataLoader::preview(&df, 2).height(), 2);
        assert_eq!(DataLoader::preview(&df, 10).height(), 3);
    }
}
