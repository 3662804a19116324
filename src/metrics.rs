//! Category performance, customer geography and location aggregates

use std::collections::HashSet;

use polars::prelude::*;
use tracing::debug;

use crate::data::{
    OrderDataset, CUSTOMER_UNIQUE_ID, GEOLOCATION_LAT, GEOLOCATION_LNG, GEOLOCATION_STATE,
    ORDER_KEY, PRODUCT_CATEGORY,
};
use crate::error::DataResult;
use crate::rank::{bottom_n, top_n};
use crate::region::state_name;

/// Distinct orders placed in one product category
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCount {
    pub category: String,
    pub order_count: u32,
}

/// Distinct customers located in one state
#[derive(Debug, Clone, PartialEq)]
pub struct RegionCount {
    pub state: String,
    pub customer_count: u32,
}

impl RegionCount {
    pub fn state_name(&self) -> &'static str {
        state_name(&self.state)
    }
}

/// A customer's position for the map scatter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CustomerLocation {
    pub lat: f64,
    pub lng: f64,
}

/// Distinct order count per product category, ordered by category name
///
/// Rows without a category are ignored.
pub fn category_order_counts(dataset: &OrderDataset) -> DataResult<Vec<CategoryCount>> {
    let counts = distinct_counts(dataset, PRODUCT_CATEGORY, ORDER_KEY)?
        .into_iter()
        .map(|(category, order_count)| CategoryCount {
            category,
            order_count,
        })
        .collect::<Vec<_>>();

    debug!(categories = counts.len(), "computed category order counts");
    Ok(counts)
}

/// Distinct customer count per state, ordered by state code
///
/// Rows without a state are ignored.
pub fn region_customer_counts(dataset: &OrderDataset) -> DataResult<Vec<RegionCount>> {
    let counts = distinct_counts(dataset, GEOLOCATION_STATE, CUSTOMER_UNIQUE_ID)?
        .into_iter()
        .map(|(state, customer_count)| RegionCount {
            state,
            customer_count,
        })
        .collect::<Vec<_>>();

    debug!(states = counts.len(), "computed region customer counts");
    Ok(counts)
}

pub fn best_categories(counts: &[CategoryCount], n: usize) -> Vec<CategoryCount> {
    top_n(counts, n, |c| c.order_count)
}

pub fn worst_categories(counts: &[CategoryCount], n: usize) -> Vec<CategoryCount> {
    bottom_n(counts, n, |c| c.order_count)
}

pub fn most_active_state(counts: &[RegionCount]) -> Option<RegionCount> {
    top_n(counts, 1, |c| c.customer_count).into_iter().next()
}

pub fn least_active_state(counts: &[RegionCount]) -> Option<RegionCount> {
    bottom_n(counts, 1, |c| c.customer_count).into_iter().next()
}

/// One location per distinct customer, taken from their first row
///
/// Customers whose first row has no coordinates are left off the map.
pub fn customer_locations(dataset: &OrderDataset) -> DataResult<Vec<CustomerLocation>> {
    let frame = dataset.frame();
    let customers = frame.column(CUSTOMER_UNIQUE_ID)?.str()?;
    let lats = frame.column(GEOLOCATION_LAT)?.f64()?;
    let lngs = frame.column(GEOLOCATION_LNG)?.f64()?;

    let mut seen = HashSet::new();
    let mut locations = Vec::new();

    for ((customer, lat), lng) in customers.into_iter().zip(lats).zip(lngs) {
        let Some(customer) = customer else { continue };
        if !seen.insert(customer) {
            continue;
        }
        if let (Some(lat), Some(lng)) = (lat, lng) {
            locations.push(CustomerLocation { lat, lng });
        }
    }

    Ok(locations)
}

fn distinct_counts(
    dataset: &OrderDataset,
    key: &str,
    counted: &str,
) -> DataResult<Vec<(String, u32)>> {
    let grouped = dataset
        .frame()
        .clone()
        .lazy()
        .filter(col(key).is_not_null())
        .group_by([col(key)])
        .agg([col(counted).drop_nulls().n_unique().alias("count")])
        .collect()?;

    let count = grouped.column("count")?.cast(&DataType::UInt32)?;
    let mut rows: Vec<(String, u32)> = grouped
        .column(key)?
        .str()?
        .into_no_null_iter()
        .zip(count.u32()?.into_no_null_iter())
        .map(|(key, count)| (key.to_string(), count))
        .collect();

    rows.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(rows)
}
