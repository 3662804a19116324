//! Olist insights: descriptive analytics over a merged e-commerce order table
//!
//! This library loads the order/customer/geolocation dataset, computes
//! category performance, customer geography and RFM (Recency, Frequency,
//! Monetary) scores, and renders them as charts.

pub mod cli;
pub mod currency;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod metrics;
pub mod rank;
pub mod region;
pub mod rfm;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use dashboard::Dashboard;
pub use data::{load_orders, OrderDataset, OrderRecord};
pub use error::{DataError, DataResult};
pub use metrics::{CategoryCount, CustomerLocation, RegionCount};
pub use rank::{bottom_n, top_n, Direction};
pub use region::state_name;
pub use rfm::{compute_rfm, RfmAxis, RfmRecord, RfmSummary, RfmTable};
pub use viz::generate_dashboard_report;

/// Common result type used by the application layer
pub type Result<T> = anyhow::Result<T>;
