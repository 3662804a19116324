//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;

/// E-commerce insights: category performance, customer geography and RFM scoring
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the merged order/customer/geolocation CSV
    #[arg(short, long, default_value = "all_data.csv")]
    pub input: PathBuf,

    /// Directory the chart images are written to
    #[arg(short, long, default_value = "dashboard")]
    pub output_dir: PathBuf,

    /// Number of entries in each best/worst ranking
    #[arg(
        short = 'n',
        long,
        default_value = "5",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub top: u16,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Default log filter when `OLIST_INSIGHTS_LOG` is unset
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}
