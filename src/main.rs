//! Olist insights: loads the order table once, computes every aggregate and
//! renders the dashboard charts.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use olist_insights::{generate_dashboard_report, load_orders, Args, Dashboard};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level());

    println!("Olist E-Commerce Dashboard");
    println!("==========================");

    let start_time = Instant::now();

    // Step 1: Load the dataset
    let dataset = load_orders(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    println!("✓ Data loaded: {} order rows", dataset.len());

    // Step 2: Compute all aggregates
    let dashboard = Dashboard::build(dataset, usize::from(args.top))?;
    println!("✓ RFM scores computed for {} customers", dashboard.rfm().len());
    if args.verbose {
        if let Some(date) = dashboard.dataset().latest_purchase_date()? {
            println!("  Latest purchase date: {}", date);
        }
    }

    // Step 3: Render charts and report
    let paths = generate_dashboard_report(&dashboard, &args.output_dir)?;

    println!("\n=== Dashboard Complete ===");
    println!("Total processing time: {:.2}s", start_time.elapsed().as_secs_f64());
    for path in paths {
        println!("Chart saved to: {}", path.display());
    }

    Ok(())
}

/// Initialize tracing with the OLIST_INSIGHTS_LOG environment variable
fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("OLIST_INSIGHTS_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
