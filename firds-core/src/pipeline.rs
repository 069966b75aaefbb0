//! Pipeline orchestrator: locate → fetch → extract → upload.
//!
//! Strictly sequential. Each stage consumes the previous stage's output and
//! the first error aborts the run.

use crate::archive::ArchiveFetcher;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::extract::extract_to_csv;
use crate::feed::FeedLocator;
use crate::http::build_client;
use crate::storage::{upload_csv, ObjectStore};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{info, info_span};

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub archive_url: String,
    pub record_count: usize,
    pub csv_path: PathBuf,
    /// `bucket/object` when the CSV was uploaded.
    pub uploaded_to: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub struct Pipeline<'a> {
    config: PipelineConfig,
    locator: FeedLocator,
    fetcher: ArchiveFetcher,
    store: Option<&'a dyn ObjectStore>,
}

impl<'a> Pipeline<'a> {
    /// Build the pipeline. With `store` set to `None` the run ends after the
    /// CSV is written, regardless of `config.upload.enabled`.
    pub fn new(config: PipelineConfig, store: Option<&'a dyn ObjectStore>) -> Result<Self> {
        let client = build_client(&config.http)?;
        Ok(Self {
            locator: FeedLocator::new(client.clone()),
            fetcher: ArchiveFetcher::new(client),
            config,
            store,
        })
    }

    pub fn run(&self) -> Result<RunSummary> {
        let _span = info_span!("pipeline").entered();
        let started_at = Utc::now();
        let cfg = &self.config;

        let archive_url = self.locator.locate(&cfg.feed_url, cfg.feed_index)?;
        let records = self.fetcher.fetch_records(&archive_url)?;
        extract_to_csv(&records, &cfg.csv_path)?;

        let uploaded_to = match self.store {
            Some(store) if cfg.upload.enabled => {
                upload_csv(
                    store,
                    &cfg.upload.bucket,
                    &cfg.csv_path,
                    &cfg.upload.object_name,
                )?;
                Some(format!("{}/{}", cfg.upload.bucket, cfg.upload.object_name))
            }
            _ => None,
        };

        info!("terminated successfully");
        Ok(RunSummary {
            archive_url,
            record_count: records.len(),
            csv_path: cfg.csv_path.clone(),
            uploaded_to,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
