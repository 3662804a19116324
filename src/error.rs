//! Error types for dataset loading and aggregation

use polars::prelude::PolarsError;
use thiserror::Error;

/// Data-shape problems surfaced while loading or aggregating the order table
#[derive(Error, Debug)]
pub enum DataError {
    #[error("missing required column `{0}`")]
    MissingColumn(String),

    #[error("invalid order_purchase_timestamp {value:?} at row {row}")]
    InvalidTimestamp { row: usize, value: String },

    #[error("invalid number {value:?} in column `{column}` at row {row}")]
    InvalidNumber {
        column: &'static str,
        row: usize,
        value: String,
    },

    #[error("missing value in column `{column}` at row {row}")]
    MissingValue { column: &'static str, row: usize },

    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
}

pub type DataResult<T> = std::result::Result<T, DataError>;
