//! Chart rendering using Plotters and the console report

use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::info;

use crate::dashboard::Dashboard;
use crate::metrics::{CategoryCount, CustomerLocation};
use crate::rfm::{RfmAxis, RfmRecord};

const HIGHLIGHT: RGBColor = RGBColor(114, 188, 212);
const MUTED: RGBColor = RGBColor(211, 211, 211);
const RFM_BAR: RGBColor = RGBColor(144, 202, 249);

/// Longitude/latitude extent of Brazil used for the map scatter
const BRAZIL_LNG: (f64, f64) = (-73.98283055, -33.8);
const BRAZIL_LAT: (f64, f64) = (-33.75116944, 5.4);

/// Customer ids are hashes; only the prefix fits under a bar
const ID_LABEL_LEN: usize = 8;

type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Best and worst categories side by side as horizontal bars
pub fn create_category_chart(
    best: &[CategoryCount],
    worst: &[CategoryCount],
    output_path: &Path,
) -> crate::Result<()> {
    let root = BitMapBackend::new(output_path, (1600, 500)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(
        "Best and Worst Performing Category by Order Count",
        ("sans-serif", 30),
    )?;

    let panels = root.split_evenly((1, 2));
    draw_category_panel(&panels[0], "Best Performing Category", best)?;
    draw_category_panel(&panels[1], "Worst Performing Category", worst)?;

    root.present()?;
    info!(path = %output_path.display(), "category chart written");
    Ok(())
}

fn draw_category_panel(
    area: &Panel<'_>,
    title: &str,
    rows: &[CategoryCount],
) -> crate::Result<()> {
    let slots = rows.len().max(1);
    let max_count = rows.iter().map(|r| r.order_count).max().unwrap_or(0).max(1) as f64;

    // First-ranked row goes on top
    let slot_of = |rank: usize| slots - 1 - rank;
    let label_for = |value: &SegmentValue<usize>| match value {
        SegmentValue::CenterOf(slot) if *slot < rows.len() => {
            rows[slots - 1 - slot].category.clone()
        }
        _ => String::new(),
    };

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(220)
        .build_cartesian_2d(0f64..(max_count * 1.1), (0..slots).into_segmented())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc("Order count")
        .y_labels(slots)
        .y_label_formatter(&label_for)
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(rows.iter().enumerate().map(|(rank, row)| {
        let color = if rank == 0 { HIGHLIGHT } else { MUTED };
        let slot = slot_of(rank);
        Rectangle::new(
            [
                (0.0, SegmentValue::Exact(slot)),
                (row.order_count as f64, SegmentValue::Exact(slot + 1)),
            ],
            color.filled(),
        )
    }))?;

    Ok(())
}

/// Top customers along each RFM axis as three bar panels
pub fn create_rfm_chart(dashboard: &Dashboard, output_path: &Path) -> crate::Result<()> {
    let root = BitMapBackend::new(output_path, (1800, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled("Best Customer Based on RFM Parameters", ("sans-serif", 30))?;

    let panels = root.split_evenly((1, 3));
    for (panel, axis) in panels.iter().zip(RfmAxis::ALL) {
        draw_rfm_panel(panel, axis, &dashboard.best_customers(axis))?;
    }

    root.present()?;
    info!(path = %output_path.display(), "RFM chart written");
    Ok(())
}

fn draw_rfm_panel(
    area: &Panel<'_>,
    axis: RfmAxis,
    customers: &[RfmRecord],
) -> crate::Result<()> {
    let slots = customers.len().max(1);
    let max_value = customers
        .iter()
        .map(|c| axis.value(c))
        .fold(0.0, f64::max)
        .max(1.0);

    let label_for = |value: &SegmentValue<usize>| match value {
        SegmentValue::CenterOf(idx) if *idx < customers.len() => customers[*idx]
            .customer_unique_id
            .chars()
            .take(ID_LABEL_LEN)
            .collect(),
        _ => String::new(),
    };

    let mut chart = ChartBuilder::on(area)
        .caption(axis.label(), ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((0..slots).into_segmented(), 0f64..(max_value * 1.1))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("customer_unique_id")
        .x_labels(slots)
        .x_label_formatter(&label_for)
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(customers.iter().enumerate().map(|(idx, customer)| {
        Rectangle::new(
            [
                (SegmentValue::Exact(idx), 0.0),
                (SegmentValue::Exact(idx + 1), axis.value(customer)),
            ],
            RFM_BAR.filled(),
        )
    }))?;

    Ok(())
}

/// Scatter of one point per customer over Brazil's extent
pub fn create_customer_map(
    locations: &[CustomerLocation],
    output_path: &Path,
) -> crate::Result<()> {
    let root = BitMapBackend::new(output_path, (800, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Customer Locations", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(BRAZIL_LNG.0..BRAZIL_LNG.1, BRAZIL_LAT.0..BRAZIL_LAT.1)?;

    chart
        .configure_mesh()
        .x_desc("Longitude")
        .y_desc("Latitude")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(
        locations
            .iter()
            .map(|loc| Circle::new((loc.lng, loc.lat), 1, BLUE.mix(0.3).filled())),
    )?;

    root.present()?;
    info!(path = %output_path.display(), points = locations.len(), "customer map written");
    Ok(())
}

/// Print every dashboard metric to the console
pub fn print_dashboard_report(dashboard: &Dashboard) {
    println!("\n=== Best & Worst Performing Product Category ===");
    println!("  Best:");
    for row in dashboard.best_categories() {
        println!("    {:40} {:>8}", row.category, row.order_count);
    }
    println!("  Worst:");
    for row in dashboard.worst_categories() {
        println!("    {:40} {:>8}", row.category, row.order_count);
    }

    println!("\n=== Customer Demographics ===");
    match dashboard.most_active_state() {
        Some(state) => println!(
            "  Most active customer state:  {} ({} customers)",
            state.state_name(),
            state.customer_count
        ),
        None => println!("  Most active customer state:  n/a"),
    }
    match dashboard.least_active_state() {
        Some(state) => println!(
            "  Least active customer state: {} ({} customers)",
            state.state_name(),
            state.customer_count
        ),
        None => println!("  Least active customer state: n/a"),
    }

    println!("\n=== Best Customer Based on RFM Parameters ===");
    match dashboard.rfm_summary() {
        Some(summary) => {
            println!("  Average Recency (days): {:.1}", summary.avg_recency);
            println!("  Average Frequency:      {:.2}", summary.avg_frequency);
            println!("  Average Monetary:       {}", summary.monetary_display());
        }
        None => println!("  No customers in dataset"),
    }

    for axis in RfmAxis::ALL {
        println!("\n  {}:", axis.label());
        for customer in dashboard.best_customers(axis) {
            println!(
                "    {:34} recency={:>4} frequency={:>3} monetary={:>10.2}",
                customer.customer_unique_id, customer.recency, customer.frequency, customer.monetary
            );
        }
    }
}

/// Render every chart into `output_dir` and print the console report
///
/// # Returns
/// * Paths of the written PNG files
pub fn generate_dashboard_report(
    dashboard: &Dashboard,
    output_dir: &Path,
) -> crate::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;

    let category_path = output_dir.join("categories.png");
    create_category_chart(
        &dashboard.best_categories(),
        &dashboard.worst_categories(),
        &category_path,
    )?;

    let rfm_path = output_dir.join("rfm.png");
    create_rfm_chart(dashboard, &rfm_path)?;

    let map_path = output_dir.join("customer_map.png");
    create_customer_map(dashboard.customer_locations(), &map_path)?;

    print_dashboard_report(dashboard);

    Ok(vec![category_path, rfm_path, map_path])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{OrderDataset, OrderRecord};
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn create_test_dashboard() -> Dashboard {
        let records: Vec<OrderRecord> = (1..=6u32)
            .map(|i| OrderRecord {
                customer_unique_id: format!("861eff4711a542e4b93843c6dd7febb{i}"),
                customer_id: format!("order-{i}"),
                order_id: None,
                purchased_at: NaiveDate::from_ymd_opt(2018, 5, i)
                    .unwrap()
                    .and_hms_opt(14, 0, 0)
                    .unwrap(),
                price: Some(12.5 * i as f64),
                category: Some(
                    if i % 2 == 0 {
                        "bed_bath_table"
                    } else {
                        "sports_leisure"
                    }
                    .to_string(),
                ),
                state: Some(if i < 4 { "SP" } else { "RS" }.to_string()),
                lat: Some(-23.0 - i as f64),
                lng: Some(-46.0 - i as f64),
            })
            .collect();

        Dashboard::build(OrderDataset::from_records(&records).unwrap(), 5).unwrap()
    }

    #[test]
    fn test_create_category_chart() {
        let dashboard = create_test_dashboard();
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("categories.png");

        let result = create_category_chart(
            &dashboard.best_categories(),
            &dashboard.worst_categories(),
            &output_path,
        );
        assert!(result.is_ok());
        assert!(output_path.exists());
    }

    #[test]
    fn test_create_customer_map() {
        let dashboard = create_test_dashboard();
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("map.png");

        let result = create_customer_map(dashboard.customer_locations(), &output_path);
        assert!(result.is_ok());
        assert!(output_path.exists());
    }

    #[test]
    fn test_generate_dashboard_report() {
        let dashboard = create_test_dashboard();
        let temp_dir = tempdir().unwrap();
        let output_dir = temp_dir.path().join("out");

        let paths = generate_dashboard_report(&dashboard, &output_dir).unwrap();
        assert_eq!(paths.len(), 3);
        for path in paths {
            assert!(path.exists(), "missing {}", path.display());
        }
    }

    #[test]
    fn test_empty_dashboard_still_renders() {
        let dashboard = Dashboard::build(OrderDataset::from_records(&[]).unwrap(), 5).unwrap();
        let temp_dir = tempdir().unwrap();

        let paths = generate_dashboard_report(&dashboard, temp_dir.path()).unwrap();
        assert!(paths.iter().all(|p| p.exists()));
    }
}
