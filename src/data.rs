//! Data loading and order-table normalization using Polars

use std::path::Path;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tracing::{debug, info};

use crate::error::{DataError, DataResult};

pub const CUSTOMER_UNIQUE_ID: &str = "customer_unique_id";
pub const CUSTOMER_ID: &str = "customer_id";
pub const ORDER_ID: &str = "order_id";
pub const ORDER_PURCHASE_TIMESTAMP: &str = "order_purchase_timestamp";
pub const PRICE: &str = "price";
pub const PRODUCT_CATEGORY: &str = "product_category_name_english";
pub const GEOLOCATION_STATE: &str = "geolocation_state";
pub const GEOLOCATION_LAT: &str = "geolocation_lat";
pub const GEOLOCATION_LNG: &str = "geolocation_lng";

/// Columns every input table must carry
pub const REQUIRED_COLUMNS: [&str; 8] = [
    CUSTOMER_UNIQUE_ID,
    CUSTOMER_ID,
    ORDER_PURCHASE_TIMESTAMP,
    PRICE,
    PRODUCT_CATEGORY,
    GEOLOCATION_STATE,
    GEOLOCATION_LAT,
    GEOLOCATION_LNG,
];

/// Key used for distinct order counts per category
pub(crate) const ORDER_KEY: &str = "order_key";
/// Purchase date as days from the common era
pub(crate) const PURCHASE_DAY: &str = "purchase_day";

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// One denormalized order line (order + customer + item + geolocation)
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    /// Logical customer; several orders may share it
    pub customer_unique_id: String,
    /// Per-order customer identifier, one per order
    pub customer_id: String,
    pub order_id: Option<String>,
    pub purchased_at: NaiveDateTime,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub state: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Validated, immutable order table shared by every aggregation
///
/// The frame holds normalized columns: string keys, the purchase date as an
/// `Int32` day number (time of day discarded), and float prices/coordinates.
#[derive(Debug, Clone)]
pub struct OrderDataset {
    frame: DataFrame,
}

impl OrderDataset {
    /// Validate and normalize a raw frame read from the merged CSV
    pub fn from_frame(df: &DataFrame) -> DataResult<Self> {
        for name in REQUIRED_COLUMNS {
            if df.column(name).is_err() {
                return Err(DataError::MissingColumn(name.to_string()));
            }
        }

        let customer_ids = required_strings(df, CUSTOMER_ID)?;
        // Olist exports carry order_id; fall back to the per-order customer_id otherwise
        let order_keys = if df.column(ORDER_ID).is_ok() {
            string_column(df, ORDER_ID)?
        } else {
            customer_ids.iter().cloned().map(Some).collect()
        };

        let columns = Columns {
            customer_unique_ids: required_strings(df, CUSTOMER_UNIQUE_ID)?,
            customer_ids,
            order_keys,
            purchase_days: purchase_days(df)?,
            prices: float_column(df, PRICE)?,
            categories: string_column(df, PRODUCT_CATEGORY)?,
            states: string_column(df, GEOLOCATION_STATE)?,
            lats: float_column(df, GEOLOCATION_LAT)?,
            lngs: float_column(df, GEOLOCATION_LNG)?,
        };

        Ok(Self {
            frame: columns.into_frame()?,
        })
    }

    /// Build a dataset from in-memory records
    pub fn from_records(records: &[OrderRecord]) -> DataResult<Self> {
        let columns = Columns {
            customer_unique_ids: records
                .iter()
                .map(|r| r.customer_unique_id.clone())
                .collect(),
            customer_ids: records.iter().map(|r| r.customer_id.clone()).collect(),
            order_keys: records
                .iter()
                .map(|r| Some(r.order_id.clone().unwrap_or_else(|| r.customer_id.clone())))
                .collect(),
            purchase_days: records
                .iter()
                .map(|r| r.purchased_at.date().num_days_from_ce())
                .collect(),
            prices: records.iter().map(|r| not_nan(r.price)).collect(),
            categories: records.iter().map(|r| r.category.clone()).collect(),
            states: records.iter().map(|r| r.state.clone()).collect(),
            lats: records.iter().map(|r| not_nan(r.lat)).collect(),
            lngs: records.iter().map(|r| not_nan(r.lng)).collect(),
        };

        Ok(Self {
            frame: columns.into_frame()?,
        })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Most recent purchase day number over the whole table
    pub(crate) fn latest_purchase_day(&self) -> DataResult<Option<i32>> {
        Ok(self.frame.column(PURCHASE_DAY)?.i32()?.max())
    }

    /// Most recent purchase date over the whole table, `None` when empty
    pub fn latest_purchase_date(&self) -> DataResult<Option<NaiveDate>> {
        Ok(self
            .latest_purchase_day()?
            .and_then(NaiveDate::from_num_days_from_ce_opt))
    }
}

/// Load the merged order CSV and validate its schema
///
/// # Arguments
/// * `path` - Path to the CSV file
///
/// # Returns
/// * `OrderDataset` with normalized columns
pub fn load_orders<P: AsRef<Path>>(path: P) -> DataResult<OrderDataset> {
    let path = path.as_ref();

    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(10_000))
        .finish()?
        .collect()?;

    info!(rows = df.height(), path = %path.display(), "loaded order table");

    let dataset = OrderDataset::from_frame(&df)?;
    debug!(columns = ?dataset.frame().get_column_names(), "normalized order table");
    Ok(dataset)
}

/// Parse a purchase timestamp in any of the layouts found in Olist exports
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.naive_local());
    }

    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Some(ts);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

struct Columns {
    customer_unique_ids: Vec<String>,
    customer_ids: Vec<String>,
    order_keys: Vec<Option<String>>,
    purchase_days: Vec<i32>,
    prices: Vec<Option<f64>>,
    categories: Vec<Option<String>>,
    states: Vec<Option<String>>,
    lats: Vec<Option<f64>>,
    lngs: Vec<Option<f64>>,
}

impl Columns {
    fn into_frame(self) -> DataResult<DataFrame> {
        let df = DataFrame::new(vec![
            Series::new(CUSTOMER_UNIQUE_ID, self.customer_unique_ids),
            Series::new(CUSTOMER_ID, self.customer_ids),
            Series::new(ORDER_KEY, self.order_keys),
            Series::new(PURCHASE_DAY, self.purchase_days),
            Series::new(PRICE, self.prices),
            Series::new(PRODUCT_CATEGORY, self.categories),
            Series::new(GEOLOCATION_STATE, self.states),
            Series::new(GEOLOCATION_LAT, self.lats),
            Series::new(GEOLOCATION_LNG, self.lngs),
        ])?;
        Ok(df)
    }
}

fn string_column(df: &DataFrame, name: &str) -> DataResult<Vec<Option<String>>> {
    let series = df.column(name)?.cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect();
    Ok(values)
}

fn required_strings(df: &DataFrame, name: &'static str) -> DataResult<Vec<String>> {
    string_column(df, name)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| value.ok_or(DataError::MissingValue { column: name, row }))
        .collect()
}

/// Read a numeric column, treating NaN as missing
///
/// A value that is present in the file but does not parse as a number is an
/// error rather than a silent null.
fn float_column(df: &DataFrame, name: &'static str) -> DataResult<Vec<Option<f64>>> {
    let column = df.column(name)?;
    let series = column.cast(&DataType::Float64)?;
    let values = series.f64()?;

    if values.null_count() != column.null_count() {
        let raw = column.cast(&DataType::String)?;
        for (row, (value, original)) in values.into_iter().zip(raw.str()?).enumerate() {
            match (value, original) {
                (None, Some(original)) if !is_nan_literal(original) => {
                    return Err(DataError::InvalidNumber {
                        column: name,
                        row,
                        value: original.to_string(),
                    });
                }
                _ => {}
            }
        }
    }

    Ok(values.into_iter().map(not_nan).collect())
}

fn not_nan(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

fn is_nan_literal(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("nan")
}

fn purchase_days(df: &DataFrame) -> DataResult<Vec<i32>> {
    string_column(df, ORDER_PURCHASE_TIMESTAMP)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            let raw = value.unwrap_or_default();
            parse_timestamp(&raw)
                .map(|ts| ts.date().num_days_from_ce())
                .ok_or(DataError::InvalidTimestamp { row, value: raw })
        })
        .collect()
}
