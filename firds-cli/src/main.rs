//! FIRDS ETL CLI — run the pipeline or inspect its inputs.
//!
//! Commands:
//! - `run` — locate the archive, extract instruments to CSV, upload to S3
//! - `locate` — print the archive link at a feed index
//! - `config` — print the effective configuration as TOML

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use firds_core::http::build_client;
use firds_core::logging::init_file_logging;
use firds_core::{FeedLocator, ObjectStore, Pipeline, PipelineConfig, RunSummary, S3Store};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "firds-etl",
    about = "FIRDS ETL — ESMA instrument reference data to CSV and S3"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: locate, fetch, extract, upload.
    Run {
        #[command(flatten)]
        overrides: Overrides,

        /// Write the CSV but do not upload it.
        #[arg(long, default_value_t = false)]
        skip_upload: bool,

        /// Print the run summary as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the archive link at the configured feed index.
    Locate {
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Print the effective configuration as TOML.
    Config {
        #[command(flatten)]
        overrides: Overrides,
    },
}

/// Settings layered over the defaults (or over `--config`).
#[derive(Args, Default)]
struct Overrides {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Solr search URL listing published files.
    #[arg(long)]
    feed_url: Option<String>,

    /// Feed entry to download; negative counts from the end.
    #[arg(long, allow_negative_numbers = true)]
    index: Option<i64>,

    /// Local CSV output path.
    #[arg(long)]
    csv_path: Option<PathBuf>,

    /// Destination bucket.
    #[arg(long)]
    bucket: Option<String>,

    /// Destination object key.
    #[arg(long)]
    object_name: Option<String>,

    /// Bucket region.
    #[arg(long)]
    region: Option<String>,

    /// Append-only log file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// HTTP timeout in seconds. Unset means wait indefinitely.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl Overrides {
    fn resolve(self) -> Result<PipelineConfig> {
        let mut cfg = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(v) = self.feed_url {
            cfg.feed_url = v;
        }
        if let Some(v) = self.index {
            cfg.feed_index = v;
        }
        if let Some(v) = self.csv_path {
            cfg.csv_path = v;
        }
        if let Some(v) = self.bucket {
            cfg.upload.bucket = v;
        }
        if let Some(v) = self.object_name {
            cfg.upload.object_name = v;
        }
        if let Some(v) = self.region {
            cfg.upload.region = v;
        }
        if let Some(v) = self.log_file {
            cfg.log.path = v;
        }
        if let Some(v) = self.log_level {
            cfg.log.level = v;
        }
        if self.timeout_secs.is_some() {
            cfg.http.timeout_secs = self.timeout_secs;
        }
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            overrides,
            skip_upload,
            json,
        } => {
            let mut cfg = overrides.resolve()?;
            if skip_upload {
                cfg.upload.enabled = false;
            }
            run_pipeline(cfg, json)
        }
        Commands::Locate { overrides } => run_locate(overrides.resolve()?),
        Commands::Config { overrides } => {
            print!("{}", overrides.resolve()?.to_toml()?);
            Ok(())
        }
    }
}

fn run_pipeline(cfg: PipelineConfig, json: bool) -> Result<()> {
    let _log = init_file_logging(&cfg.log)
        .with_context(|| format!("failed to open log file {}", cfg.log.path.display()))?;

    let s3;
    let store: Option<&dyn ObjectStore> = if cfg.upload.enabled {
        s3 = S3Store::new(&cfg.upload.region)?;
        Some(&s3)
    } else {
        None
    };

    let pipeline = Pipeline::new(cfg, store)?;
    let summary = pipeline.run().map_err(|e| {
        tracing::error!("run aborted: {e}");
        e
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary_json(&summary))?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn run_locate(cfg: PipelineConfig) -> Result<()> {
    let _log = init_file_logging(&cfg.log)?;
    let locator = FeedLocator::new(build_client(&cfg.http)?);
    let link = locator.locate(&cfg.feed_url, cfg.feed_index)?;
    println!("{link}");
    Ok(())
}

fn summary_json(summary: &RunSummary) -> serde_json::Value {
    serde_json::json!({
        "archive_url": summary.archive_url,
        "record_count": summary.record_count,
        "csv_path": summary.csv_path.display().to_string(),
        "uploaded_to": summary.uploaded_to,
        "started_at": summary.started_at.to_rfc3339(),
        "finished_at": summary.finished_at.to_rfc3339(),
    })
}

fn print_summary(summary: &RunSummary) {
    let elapsed = summary.finished_at - summary.started_at;
    println!("Archive:  {}", summary.archive_url);
    println!("Records:  {}", summary.record_count);
    println!("CSV:      {}", summary.csv_path.display());
    match &summary.uploaded_to {
        Some(dest) => println!("Uploaded: {dest}"),
        None => println!("Uploaded: (skipped)"),
    }
    println!("Elapsed:  {:.1}s", elapsed.num_milliseconds() as f64 / 1000.0);
}
