//! Error type for report computations and exports

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("no person selected for the report")]
    MissingPerson,

    #[error("invalid date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error(
        "expense of ${requested:.2} exceeds the remaining '{category}' budget of ${remaining:.2}"
    )]
    BudgetExceeded {
        category: String,
        requested: f64,
        remaining: f64,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
