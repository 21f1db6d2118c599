//! Quarterly earnings figures
//!
//! Reported EPS and revenue/earnings are not in the price CSVs, so they are
//! carried as configuration and fed to the chart renderer from here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum FinancialsError {
    #[error("No {0} figures configured")]
    Empty(&'static str),
    #[error("Revenue for {label} must be positive, got {revenue}")]
    NonPositiveRevenue { label: String, revenue: f64 },
}

/// Actual vs. analyst-estimated earnings per share for one quarter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpsPoint {
    pub label: String,
    pub actual: f64,
    pub estimate: f64,
}

/// Reported revenue and earnings for one quarter, in billions of USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterResult {
    pub label: String,
    pub revenue: f64,
    pub earnings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Financials {
    pub eps: Vec<EpsPoint>,
    pub results: Vec<QuarterResult>,
}

impl Default for Financials {
    fn default() -> Self {
        let eps = [
            ("3Q2018", 0.26, -0.42),
            ("4Q2018", 2.6, -0.21),
            ("1Q2019", -0.89, -0.40),
            ("2Q2019", -0.46, -0.35),
            ("3Q2019", 0.40, -0.31),
        ];
        let results = [
            ("2Q-2018", 1.27, -0.394),
            ("3Q-2018", 1.35, 0.043),
            ("4Q-2018", 1.5, 0.442),
            ("1Q-2019", 1.51, -0.142),
            ("2Q-2019", 1.67, -0.076),
            ("3Q-2019", 1.73, 0.241),
        ];

        Self {
            eps: eps
                .iter()
                .map(|&(label, actual, estimate)| EpsPoint {
                    label: label.to_string(),
                    actual,
                    estimate,
                })
                .collect(),
            results: results
                .iter()
                .map(|&(label, revenue, earnings)| QuarterResult {
                    label: label.to_string(),
                    revenue,
                    earnings,
                })
                .collect(),
        }
    }
}

impl Financials {
    pub fn validate(&self) -> Result<(), FinancialsError> {
        if self.eps.is_empty() {
            return Err(FinancialsError::Empty("EPS"));
        }
        if self.results.is_empty() {
            return Err(FinancialsError::Empty("revenue/earnings"));
        }
        if let Some(bad) = self.results.iter().find(|r| r.revenue <= 0.0) {
            return Err(FinancialsError::NonPositiveRevenue {
                label: bad.label.clone(),
                revenue: bad.revenue,
            });
        }
        Ok(())
    }

    /// Earnings as a percentage of revenue, for quarters that made a profit.
    pub fn earnings_margins(&self) -> Vec<(String, f64)> {
        self.results
            .iter()
            .filter(|r| r.earnings > 0.0)
            .map(|r| (r.label.clone(), r.earnings / r.revenue * 100.0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_figures_are_valid() {
        let fin = Financials::default();
        assert_eq!(fin.eps.len(), 5);
        assert_eq!(fin.results.len(), 6);
        assert!(fin.validate().is_ok());
    }

    #[test]
    fn test_margins_only_for_profitable_quarters() {
        let margins = Financials::default().earnings_margins();
        let labels: Vec<&str> = margins.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["3Q-2018", "4Q-2018", "3Q-2019"]);

        assert!((margins[0].1 - 0.043 / 1.35 * 100.0).abs() < 1e-9);
        assert!((margins[1].1 - 29.466_666).abs() < 1e-3);
        assert!((margins[2].1 - 13.930_635).abs() < 1e-3);
    }

    #[test]
    fn test_validate_rejects_bad_revenue() {
        let mut fin = Financials::default();
        fin.results[2].revenue = 0.0;
        assert_eq!(
            fin.validate(),
            Err(FinancialsError::NonPositiveRevenue {
                label: "4Q-2018".to_string(),
                revenue: 0.0
            })
        );
    }

    #[test]
    fn test_validate_rejects_empty_series() {
        let fin = Financials {
            eps: Vec::new(),
            ..Financials::default()
        };
        assert_eq!(fin.validate(), Err(FinancialsError::Empty("EPS")));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let fin: Financials =
            serde_json::from_str(r#"{"eps": [{"label": "1Q2020", "actual": 0.1, "estimate": 0.2}]}"#)
                .unwrap();
        assert_eq!(fin.eps.len(), 1);
        assert_eq!(fin.results, Financials::default().results);
    }
}
