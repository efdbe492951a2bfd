//! Pool statistics refresh cycle from the command line
//!
//! Reads current observations and the previous aggregate snapshot, writes the
//! annotated pools and the next snapshot.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL};

use poolstats::adapters::server::load_page_data;
use poolstats::input::{load_observations, load_priors, write_aggregates, write_json};
use poolstats::logging::init_logging;
use poolstats::{AnnotatedPool, AppConfig, OutlierBoundary, StatisticsPipeline};

#[derive(Debug, Parser)]
#[command(name = "poolstats", version, about = "Compute yield-pool mu/sigma and outlier flags")]
struct Args {
    /// Current observations (.json array or .csv)
    #[arg(short, long)]
    observations: PathBuf,

    /// Previous aggregate snapshot (.json); omit on the first cycle
    #[arg(short, long)]
    priors: Option<PathBuf>,

    /// Where to write annotated pools
    #[arg(long, default_value = "pools_annotated.json")]
    output: PathBuf,

    /// Where to write the next aggregate snapshot
    #[arg(long, default_value = "aggregates.json")]
    aggregates_out: PathBuf,

    /// TOML configuration file
    #[arg(short, long, env = "POOLSTATS_CONFIG")]
    config: Option<PathBuf>,

    /// Only write pools flagged as outliers
    #[arg(long)]
    outliers_only: bool,
}

fn boundary_table(boundaries: &[OutlierBoundary]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Metric", "N", "Q1", "Median", "Q3", "IQR", "Lower", "Upper"]);

    for b in boundaries {
        table.add_row(vec![
            Cell::new(b.metric),
            Cell::new(b.sample_size),
            Cell::new(format!("{:.4}", b.q1)),
            Cell::new(format!("{:.4}", b.median)),
            Cell::new(format!("{:.4}", b.q3)),
            Cell::new(format!("{:.4}", b.iqr)),
            Cell::new(format!("{:.4}", b.lower_bound)),
            Cell::new(format!("{:.4}", b.upper_bound)),
        ]);
    }

    table
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = AppConfig::load(args.config.as_deref()).context("loading configuration")?;
    init_logging(&config.logging)?;

    let start = Instant::now();

    let observations = load_observations(&args.observations)
        .with_context(|| format!("reading {}", args.observations.display()))?;
    let priors = match &args.priors {
        Some(path) => load_priors(path).with_context(|| format!("reading {}", path.display()))?,
        None => Default::default(),
    };

    println!("📊 Pool statistics refresh");
    println!("   Observations: {}", observations.len());
    println!("   Prior aggregates: {}", priors.len());

    let pipeline = StatisticsPipeline::with_config(config.pipeline.clone())?;
    let page = load_page_data(&pipeline, &observations, &priors)?;

    println!(
        "✅ {} eligible pools, {} outliers ({:.2}s)",
        page.pool_count,
        page.outlier_count,
        start.elapsed().as_secs_f64()
    );

    if !page.boundaries.is_empty() {
        println!("{}", boundary_table(&page.boundaries));
    }

    let pools: Vec<&AnnotatedPool> = page
        .pools
        .iter()
        .filter(|p| !args.outliers_only || p.is_outlier())
        .collect();

    write_json(&args.output, &pools)
        .with_context(|| format!("writing {}", args.output.display()))?;
    write_aggregates(&args.aggregates_out, &page.aggregates)
        .with_context(|| format!("writing {}", args.aggregates_out.display()))?;

    println!("💾 Annotated pools: {}", args.output.display());
    println!("💾 Aggregates: {}", args.aggregates_out.display());

    Ok(())
}
