//! Recency / Frequency / Monetary customer scoring

use polars::prelude::*;
use tracing::info;

use crate::currency::format_brl;
use crate::data::{OrderDataset, CUSTOMER_ID, CUSTOMER_UNIQUE_ID, PRICE, PURCHASE_DAY};
use crate::error::DataResult;
use crate::rank::{select_n, Direction};

/// RFM scores for one logical customer
#[derive(Debug, Clone, PartialEq)]
pub struct RfmRecord {
    pub customer_unique_id: String,
    /// Days between the dataset's last purchase date and this customer's
    pub recency: i64,
    /// Distinct orders placed
    pub frequency: u32,
    /// Total spend over all order lines
    pub monetary: f64,
}

/// One of the three RFM dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RfmAxis {
    Recency,
    Frequency,
    Monetary,
}

impl RfmAxis {
    pub const ALL: [RfmAxis; 3] = [RfmAxis::Recency, RfmAxis::Frequency, RfmAxis::Monetary];

    /// Ranking direction for "best" customers on this axis
    pub fn direction(self) -> Direction {
        match self {
            // Smaller recency means a more recent purchase
            RfmAxis::Recency => Direction::Ascending,
            RfmAxis::Frequency | RfmAxis::Monetary => Direction::Descending,
        }
    }

    pub fn value(self, record: &RfmRecord) -> f64 {
        match self {
            RfmAxis::Recency => record.recency as f64,
            RfmAxis::Frequency => f64::from(record.frequency),
            RfmAxis::Monetary => record.monetary,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RfmAxis::Recency => "By Recency (days)",
            RfmAxis::Frequency => "By Frequency",
            RfmAxis::Monetary => "By Monetary",
        }
    }
}

/// Averages shown above the RFM charts
#[derive(Debug, Clone, PartialEq)]
pub struct RfmSummary {
    /// Rounded to one decimal
    pub avg_recency: f64,
    /// Rounded to two decimals
    pub avg_frequency: f64,
    pub avg_monetary: f64,
}

impl RfmSummary {
    pub fn monetary_display(&self) -> String {
        format_brl(self.avg_monetary)
    }
}

/// Per-customer RFM table ordered by `customer_unique_id`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RfmTable {
    records: Vec<RfmRecord>,
}

impl RfmTable {
    pub fn records(&self) -> &[RfmRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, customer_unique_id: &str) -> Option<&RfmRecord> {
        self.records
            .binary_search_by(|r| r.customer_unique_id.as_str().cmp(customer_unique_id))
            .ok()
            .map(|idx| &self.records[idx])
    }

    /// The `n` best customers along `axis`
    pub fn best_by(&self, axis: RfmAxis, n: usize) -> Vec<RfmRecord> {
        select_n(&self.records, n, axis.direction(), |r| axis.value(r))
    }

    /// Mean recency, frequency and monetary, `None` for an empty table
    pub fn summary(&self) -> Option<RfmSummary> {
        if self.records.is_empty() {
            return None;
        }

        let count = self.records.len() as f64;
        let mean = |axis: RfmAxis| self.records.iter().map(|r| axis.value(r)).sum::<f64>() / count;

        Some(RfmSummary {
            avg_recency: round_to(mean(RfmAxis::Recency), 1),
            avg_frequency: round_to(mean(RfmAxis::Frequency), 2),
            avg_monetary: mean(RfmAxis::Monetary),
        })
    }
}

/// Compute RFM scores for every distinct customer
///
/// Purchase timestamps are already truncated to calendar days in the
/// dataset, so recency is a whole number of days.
pub fn compute_rfm(dataset: &OrderDataset) -> DataResult<RfmTable> {
    let Some(latest_day) = dataset.latest_purchase_day()? else {
        return Ok(RfmTable::default());
    };

    let rfm_df = dataset
        .frame()
        .clone()
        .lazy()
        .group_by([col(CUSTOMER_UNIQUE_ID)])
        .agg([
            col(PURCHASE_DAY).max().alias("max_order_day"),
            col(CUSTOMER_ID).n_unique().alias("frequency"),
            col(PRICE).sum().alias("monetary"),
        ])
        .with_columns([(lit(latest_day) - col("max_order_day")).alias("recency")])
        .select([
            col(CUSTOMER_UNIQUE_ID),
            col("recency"),
            col("frequency"),
            col("monetary"),
        ])
        .collect()?;

    let recency = rfm_df.column("recency")?.cast(&DataType::Int64)?;
    let frequency = rfm_df.column("frequency")?.cast(&DataType::UInt32)?;
    let monetary = rfm_df.column("monetary")?.cast(&DataType::Float64)?;

    let mut records: Vec<RfmRecord> = rfm_df
        .column(CUSTOMER_UNIQUE_ID)?
        .str()?
        .into_no_null_iter()
        .zip(recency.i64()?.into_no_null_iter())
        .zip(frequency.u32()?.into_no_null_iter())
        .zip(monetary.f64()?.into_no_null_iter())
        .map(|(((id, recency), frequency), monetary)| RfmRecord {
            customer_unique_id: id.to_string(),
            recency,
            frequency,
            monetary,
        })
        .collect();

    records.sort_by(|a, b| a.customer_unique_id.cmp(&b.customer_unique_id));

    info!(customers = records.len(), "computed RFM table");
    Ok(RfmTable { records })
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::OrderRecord;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn order(customer: &str, order: &str, purchased_at: NaiveDateTime, price: f64) -> OrderRecord {
        OrderRecord {
            customer_unique_id: customer.to_string(),
            customer_id: order.to_string(),
            order_id: None,
            purchased_at,
            price: Some(price),
            category: None,
            state: None,
            lat: None,
            lng: None,
        }
    }

    fn rfm_for(records: &[OrderRecord]) -> RfmTable {
        compute_rfm(&OrderDataset::from_records(records).unwrap()).unwrap()
    }

    #[test]
    fn test_two_customer_example() {
        let table = rfm_for(&[
            order("A", "a1", at(1, 9, 0), 10.0),
            order("A", "a2", at(10, 9, 0), 20.0),
            order("B", "b1", at(10, 18, 30), 5.0),
        ]);

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.get("A"),
            Some(&RfmRecord {
                customer_unique_id: "A".to_string(),
                recency: 0,
                frequency: 2,
                monetary: 30.0,
            })
        );
        assert_eq!(
            table.get("B"),
            Some(&RfmRecord {
                customer_unique_id: "B".to_string(),
                recency: 0,
                frequency: 1,
                monetary: 5.0,
            })
        );
    }

    #[test]
    fn test_frequency_counts_distinct_orders() {
        let table = rfm_for(&[
            order("A", "a1", at(3, 10, 0), 1.0),
            order("A", "a1", at(3, 10, 0), 2.0),
            order("A", "a1", at(3, 10, 0), 3.0),
            order("A", "a2", at(4, 10, 0), 4.0),
        ]);

        let a = table.get("A").unwrap();
        assert_eq!(a.frequency, 2);
        assert_eq!(a.monetary, 10.0);
    }

    #[test]
    fn test_monetary_sums_fractional_and_zero_prices() {
        let table = rfm_for(&[
            order("A", "a1", at(3, 10, 0), 0.1),
            order("A", "a2", at(4, 10, 0), 0.0),
            order("A", "a3", at(5, 10, 0), 0.2),
            order("B", "b1", at(5, 10, 0), 0.0),
        ]);

        assert!((table.get("A").unwrap().monetary - 0.3).abs() < 1e-9);
        assert_eq!(table.get("B").unwrap().monetary, 0.0);
    }

    #[test]
    fn test_recency_uses_calendar_dates() {
        // 23:59 on day 9 is one calendar day before 00:01 on day 10
        let table = rfm_for(&[
            order("late", "l1", at(9, 23, 59), 1.0),
            order("early", "e1", at(10, 0, 1), 1.0),
            order("old", "o1", at(1, 12, 0), 1.0),
        ]);

        assert_eq!(table.get("late").unwrap().recency, 1);
        assert_eq!(table.get("early").unwrap().recency, 0);
        assert_eq!(table.get("old").unwrap().recency, 9);
        assert!(table.records().iter().all(|r| r.recency >= 0 && r.frequency >= 1));
    }

    #[test]
    fn test_records_ordered_by_customer() {
        let table = rfm_for(&[
            order("c", "c1", at(1, 0, 0), 1.0),
            order("a", "a1", at(2, 0, 0), 1.0),
            order("b", "b1", at(3, 0, 0), 1.0),
            order("a", "a2", at(4, 0, 0), 1.0),
        ]);

        let ids: Vec<&str> = table
            .records()
            .iter()
            .map(|r| r.customer_unique_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_input() {
        let table = rfm_for(&[]);
        assert!(table.is_empty());
        assert!(table.best_by(RfmAxis::Monetary, 5).is_empty());
        assert_eq!(table.summary(), None);
    }

    #[test]
    fn test_best_by_axis_direction() {
        let table = rfm_for(&[
            order("a", "a1", at(1, 0, 0), 50.0),
            order("b", "b1", at(8, 0, 0), 5.0),
            order("b", "b2", at(9, 0, 0), 5.0),
            order("c", "c1", at(10, 0, 0), 20.0),
        ]);

        let ids = |records: Vec<RfmRecord>| {
            records
                .into_iter()
                .map(|r| r.customer_unique_id)
                .collect::<Vec<_>>()
        };

        assert_eq!(ids(table.best_by(RfmAxis::Recency, 2)), vec!["c", "b"]);
        assert_eq!(ids(table.best_by(RfmAxis::Frequency, 1)), vec!["b"]);
        assert_eq!(ids(table.best_by(RfmAxis::Monetary, 3)), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_summary() {
        let table = rfm_for(&[
            order("a", "a1", at(1, 0, 0), 100.0),
            order("b", "b1", at(9, 0, 0), 10.0),
            order("b", "b2", at(10, 0, 0), 10.0),
            order("c", "c1", at(10, 0, 0), 1.5),
        ]);

        let summary = table.summary().unwrap();
        // recencies 9, 0, 0 and frequencies 1, 2, 1
        assert_eq!(summary.avg_recency, 3.0);
        assert_eq!(summary.avg_frequency, 1.33);
        assert!((summary.avg_monetary - 40.5).abs() < 1e-9);
        assert_eq!(summary.monetary_display(), "R$\u{a0}40,50");
    }
}
