//! Date-to-Quarter Mapper Module
//! Derives fiscal quarter labels ("Q3-2018") from trading dates.

use super::{DATE_COL, QUARTER_COL};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// A row whose date cannot be decomposed into year and month.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed date at row {row}: {}", cell_text(value))]
pub struct MalformedDateError {
    /// Zero-based row index in the source table.
    pub row: usize,
    /// Raw cell content, `None` for a null cell.
    pub value: Option<String>,
}

fn cell_text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("<null>")
}

#[derive(Error, Debug)]
pub enum MapperError {
    #[error(transparent)]
    MalformedDate(#[from] MalformedDateError),
    #[error("Missing column: {0}")]
    MissingColumn(String),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// One of the four three-month buckets of a calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Quarter {
    year: i32,
    number: u8,
}

impl Quarter {
    /// Months 1-3 map to Q1, 4-6 to Q2, 7-9 to Q3 and 10-12 to Q4.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            number: (date.month0() / 3 + 1) as u8,
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn number(&self) -> u8 {
        self.number
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}-{:04}", self.number, self.year)
    }
}

/// Parse a `YYYY-MM-DD` date (a trailing `HH:MM:SS` is tolerated).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .ok()
}

/// Adds the `Quarter` column to a price table.
pub struct QuarterMapper;

impl QuarterMapper {
    /// Derive a quarter label for every row from its `Date` cell.
    ///
    /// Aborts on the first row whose date does not parse; the `Date`
    /// column itself is left untouched.
    pub fn with_quarter(mut df: DataFrame) -> Result<DataFrame, MapperError> {
        let dates = df
            .column(DATE_COL)
            .map_err(|_| MapperError::MissingColumn(DATE_COL.to_string()))?
            .cast(&DataType::String)?;
        let dates_ca = dates.str()?;

        let mut quarters: Vec<String> = Vec::with_capacity(df.height());
        for (row, value) in dates_ca.into_iter().enumerate() {
            let date = value.and_then(parse_date).ok_or_else(|| MalformedDateError {
                row,
                value: value.map(str::to_string),
            })?;
            quarters.push(Quarter::from_date(date).to_string());
        }

        df.with_column(Column::new(QUARTER_COL.into(), quarters))?;
        debug!(rows = df.height(), "Derived quarter labels");
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quarter_of(raw: &str) -> String {
        Quarter::from_date(parse_date(raw).unwrap()).to_string()
    }

    #[test]
    fn test_month_partition() {
        for month in 1..=12u32 {
            let date = NaiveDate::from_ymd_opt(2019, month, 1).unwrap();
            let expected = match month {
                1..=3 => "Q1-2019",
                4..=6 => "Q2-2019",
                7..=9 => "Q3-2019",
                _ => "Q4-2019",
            };
            assert_eq!(Quarter::from_date(date).to_string(), expected);
        }
    }

    #[test]
    fn test_known_dates() {
        assert_eq!(quarter_of("2018-07-15"), "Q3-2018");
        assert_eq!(quarter_of("2018-11-01"), "Q4-2018");
        assert_eq!(quarter_of("2019-03-31"), "Q1-2019");
        assert_eq!(quarter_of("2018-04-03 00:00:00"), "Q2-2018");
    }

    #[test]
    fn test_year_is_kept_verbatim() {
        let q = Quarter::from_date(parse_date("1999-12-31").unwrap());
        assert_eq!(q.year(), 1999);
        assert_eq!(q.number(), 4);
    }

    #[test]
    fn test_year_keeps_four_digits() {
        assert_eq!(quarter_of("0999-01-05"), "Q1-0999");
        assert_eq!(quarter_of("0042-08-01"), "Q3-0042");
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("").is_none());
        assert!(parse_date("2018/07/15").is_none());
        assert!(parse_date("2018-13-01").is_none());
        assert!(parse_date("July 15, 2018").is_none());
    }

    #[test]
    fn test_with_quarter_adds_column_and_keeps_date() {
        let df = df!(
            "Date" => ["2018-07-15", "2018-11-01", "2019-02-28"],
            "Adj Close" => [196.28, 106.84, 135.0]
        )
        .unwrap();

        let out = QuarterMapper::with_quarter(df).unwrap();

        let quarters: Vec<&str> = out
            .column(QUARTER_COL)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(quarters, vec!["Q3-2018", "Q4-2018", "Q1-2019"]);

        let dates: Vec<&str> = out
            .column(DATE_COL)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(dates, vec!["2018-07-15", "2018-11-01", "2019-02-28"]);
        assert_eq!(out.width(), 3);
    }

    #[test]
    fn test_malformed_date_identifies_row() {
        let df = df!(
            "Date" => ["2018-07-15", "15/07/2018", "2018-11-01"],
            "Adj Close" => [196.28, 190.0, 106.84]
        )
        .unwrap();

        match QuarterMapper::with_quarter(df) {
            Err(MapperError::MalformedDate(err)) => {
                assert_eq!(err.row, 1);
                assert_eq!(err.value.as_deref(), Some("15/07/2018"));
                assert_eq!(err.to_string(), "Malformed date at row 1: 15/07/2018");
            }
            other => panic!("expected MalformedDate, got {:?}", other.map(|df| df.height())),
        }
    }

    #[test]
    fn test_null_date_is_malformed() {
        let df = df!(
            "Date" => [Some("2018-07-15"), None],
            "Adj Close" => [196.28, 190.0]
        )
        .unwrap();

        match QuarterMapper::with_quarter(df) {
            Err(MapperError::MalformedDate(err)) => {
                assert_eq!(err, MalformedDateError { row: 1, value: None });
                assert_eq!(err.to_string(), "Malformed date at row 1: <null>");
            }
            other => panic!("expected MalformedDate, got {:?}", other.map(|df| df.height())),
        }
    }

    #[test]
    fn test_missing_date_column() {
        let df = df!("Adj Close" => [196.28]).unwrap();
        assert!(matches!(
            QuarterMapper::with_quarter(df),
            Err(MapperError::MissingColumn(name)) if name == DATE_COL
        ));
    }
}
