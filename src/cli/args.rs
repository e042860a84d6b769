use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::utils::constants::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_ATTEMPTS};

#[derive(Parser)]
#[command(name = "airq-pipeline")]
#[command(about = "Urban air-quality ETL pipeline")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        default_value = "data",
        help = "Base directory for raw, staged and processed data"
    )]
    pub data_dir: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full extract -> transform -> load -> analyze pipeline
    Run {
        #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
        max_attempts: u32,

        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },

    /// Fetch raw air-quality data for the configured cities
    Extract {
        #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
        max_attempts: u32,
    },

    /// Stage the latest raw artifacts into a transformed CSV dataset
    Transform,

    /// Load the latest staged dataset into the sink table
    Load {
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },

    /// Compute KPI metrics and trend datasets from the sink table
    Analyze,
}
