//! Backlot - CLI entry point
//!
//! Runs the geoprocessing pipeline on a JSON job file and prints the
//! outcome as JSON. The job file carries everything one invocation needs:
//! parcel, setbacks, obstacles, zoning rules, unit spec, and the proposed
//! development.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use backlot::core::config::PipelineConfig;
use backlot::core::error::Result;
use backlot::core::types::CancelToken;
use backlot::parcel::{DevelopmentSpec, Obstacle, Parcel, SetbackSpec, UnitSpec};
use backlot::pipeline::run_pipeline;
use backlot::zoning::ZoningRules;

#[derive(Parser, Debug)]
#[command(name = "backlot", about = "Buildable backyard analysis for one parcel")]
struct Args {
    /// JSON job file with parcel, rules, obstacles, and unit spec
    job: PathBuf,

    /// Optional TOML pipeline configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Abort the search after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Pretty-print the outcome
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Deserialize)]
struct JobFile {
    parcel: Parcel,
    #[serde(default)]
    setbacks: SetbackSpec,
    #[serde(default)]
    obstacles: Vec<Obstacle>,
    zoning_rules: ZoningRules,
    unit: UnitSpec,
    development: DevelopmentSpec,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("backlot=info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PipelineConfig::from_toml_file(path)?,
        None => PipelineConfig::default(),
    };

    let token = match args.timeout_secs {
        Some(secs) => CancelToken::with_timeout(Duration::from_secs(secs)),
        None => CancelToken::new(),
    };

    let content = std::fs::read_to_string(&args.job)?;
    let job: JobFile = serde_json::from_str(&content)?;

    tracing::info!(apn = %job.parcel.apn, "running pipeline");
    let outcome = run_pipeline(
        &job.parcel,
        &job.setbacks,
        &job.obstacles,
        &job.zoning_rules,
        &job.unit,
        &job.development,
        &config,
        &token,
    )?;

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&outcome)?
    } else {
        serde_json::to_string(&outcome)?
    };
    println!("{rendered}");

    Ok(())
}
