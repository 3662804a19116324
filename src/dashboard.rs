//! Session value holding the loaded dataset and every derived aggregate

use tracing::info;

use crate::data::OrderDataset;
use crate::error::DataResult;
use crate::metrics::{
    self, category_order_counts, customer_locations, region_customer_counts, CategoryCount,
    CustomerLocation, RegionCount,
};
use crate::rfm::{compute_rfm, RfmAxis, RfmRecord, RfmSummary, RfmTable};

/// All aggregates for one session, computed eagerly from an immutable dataset
#[derive(Debug, Clone)]
pub struct Dashboard {
    dataset: OrderDataset,
    top_n: usize,
    rfm: RfmTable,
    categories: Vec<CategoryCount>,
    regions: Vec<RegionCount>,
    locations: Vec<CustomerLocation>,
}

impl Dashboard {
    /// Compute every aggregate; `top_n` sizes the category and customer rankings
    pub fn build(dataset: OrderDataset, top_n: usize) -> DataResult<Self> {
        let rfm = compute_rfm(&dataset)?;
        let categories = category_order_counts(&dataset)?;
        let regions = region_customer_counts(&dataset)?;
        let locations = customer_locations(&dataset)?;

        info!(
            rows = dataset.len(),
            customers = rfm.len(),
            categories = categories.len(),
            states = regions.len(),
            "dashboard aggregates ready"
        );

        Ok(Self {
            dataset,
            top_n,
            rfm,
            categories,
            regions,
            locations,
        })
    }

    pub fn dataset(&self) -> &OrderDataset {
        &self.dataset
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn rfm(&self) -> &RfmTable {
        &self.rfm
    }

    pub fn category_counts(&self) -> &[CategoryCount] {
        &self.categories
    }

    pub fn region_counts(&self) -> &[RegionCount] {
        &self.regions
    }

    pub fn customer_locations(&self) -> &[CustomerLocation] {
        &self.locations
    }

    pub fn best_categories(&self) -> Vec<CategoryCount> {
        metrics::best_categories(&self.categories, self.top_n)
    }

    pub fn worst_categories(&self) -> Vec<CategoryCount> {
        metrics::worst_categories(&self.categories, self.top_n)
    }

    pub fn most_active_state(&self) -> Option<RegionCount> {
        metrics::most_active_state(&self.regions)
    }

    pub fn least_active_state(&self) -> Option<RegionCount> {
        metrics::least_active_state(&self.regions)
    }

    pub fn best_customers(&self, axis: RfmAxis) -> Vec<RfmRecord> {
        self.rfm.best_by(axis, self.top_n)
    }

    pub fn rfm_summary(&self) -> Option<RfmSummary> {
        self.rfm.summary()
    }
}
