//! Configuration for an analysis run

use crate::financials::{Financials, FinancialsError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Looked up in the working directory; optional.
pub const CONFIG_FILE: &str = "stock_profile.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config value: {0}")]
    Invalid(String),
    #[error(transparent)]
    Financials(#[from] FinancialsError),
}

/// Input files, output location and chart figures of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Directory holding the three CSV inputs
    pub data_dir: PathBuf,

    /// Directory the PNG charts are written to
    pub output_dir: PathBuf,

    /// Company prices, monthly granularity
    pub monthly_csv: String,

    /// Market index prices, monthly granularity
    pub index_csv: String,

    /// Company prices, daily granularity
    pub daily_csv: String,

    /// Panel titles of the comparison chart
    pub company_name: String,
    pub index_name: String,

    /// Rows printed when inspecting a loaded table
    pub preview_rows: usize,

    pub chart_width: u32,
    pub chart_height: u32,

    pub financials: Financials,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            monthly_csv: "SPOT_monthly.csv".to_string(),
            index_csv: "DJI.csv".to_string(),
            daily_csv: "SPOT_daily.csv".to_string(),
            company_name: "Spotify".to_string(),
            index_name: "Dow Jones".to_string(),
            preview_rows: 5,
            chart_width: 1000,
            chart_height: 600,
            financials: Financials::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, name) in [
            ("monthly_csv", &self.monthly_csv),
            ("index_csv", &self.index_csv),
            ("daily_csv", &self.daily_csv),
        ] {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", key)));
            }
        }

        if self.chart_width < 200 || self.chart_height < 200 {
            return Err(ConfigError::Invalid(format!(
                "chart size {}x{} is below the 200x200 minimum",
                self.chart_width, self.chart_height
            )));
        }

        self.financials.validate()?;
        Ok(())
    }
}
