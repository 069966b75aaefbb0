//! FIRDS ETL core — feed locator, archive fetcher, CSV extractor, uploader.
//!
//! One run walks four stages in order:
//! - locate the n-th archive link in ESMA's FIRDS Solr feed
//! - download the ZIP and collect its `FinInstrm` records
//! - write six fields per record to a CSV file
//! - upload the CSV to an object-storage bucket

pub mod archive;
pub mod config;
pub mod error;
pub mod extract;
pub mod feed;
pub mod http;
pub mod logging;
pub mod pipeline;
pub mod storage;
pub mod xml;

pub use archive::{ArchiveFetcher, RECORD_TAG};
pub use config::PipelineConfig;
pub use error::{EtlError, Result};
pub use extract::{extract_to_csv, InstrumentRow, CSV_HEADER};
pub use feed::FeedLocator;
pub use pipeline::{Pipeline, RunSummary};
pub use storage::{upload_csv, upload_csv_to_s3, ObjectStore, S3Store};
