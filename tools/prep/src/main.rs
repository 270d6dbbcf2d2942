//! Dataset preparation CLI
//!
//! Usage:
//!   prep filter --input data/raw/training_data.jsonl --output data/filtered/filtered.json
//!   prep split --input data/filtered/filtered.json --seed 42 --val-fraction 0.1
//!   prep filter-text --input data/huggingface/hf_roasts.json
//!   prep stage1 --num-samples 20000 --max-len 100
//!   prep inspect --input data/llava_format/train.json

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::{FilterArgs, FilterTextArgs, InspectArgs, SplitArgs, Stage1Args};

#[derive(Parser)]
#[command(name = "prep", about = "Clean, filter and split roast training data", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean and classify collected records into conversation samples
    Filter(FilterArgs),
    /// Seeded train/validation split of a filtered sample file
    Split(SplitArgs),
    /// Clean and classify an unscored text corpus
    FilterText(FilterTextArgs),
    /// Sample short text-only warm-up data from a filtered corpus
    Stage1(Stage1Args),
    /// Print statistics and a preview of a sample file
    Inspect(InspectArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Filter(args) => commands::filter(&args),
        Commands::Split(args) => commands::split(&args),
        Commands::FilterText(args) => commands::filter_text(&args),
        Commands::Stage1(args) => commands::stage1(&args),
        Commands::Inspect(args) => commands::inspect(&args),
    }
}
