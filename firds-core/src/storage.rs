//! Uploader: pushes the finished CSV to an object-storage bucket.
//!
//! `ObjectStore` is the seam between the pipeline and the storage service so
//! the upload path can be exercised without AWS. `S3Store` is the production
//! implementation.

use crate::error::{EtlError, Result};
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use std::path::Path;
use tracing::{error, info, instrument};

/// A bucket/key addressed object store.
pub trait ObjectStore {
    /// Human-readable name of this store, for logs.
    fn name(&self) -> &str;

    /// Store `body` under `key` in `bucket`, replacing any existing object.
    fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()>;
}

/// Amazon S3, driven through the async SDK on a private runtime.
///
/// Credentials are resolved by the SDK's default provider chain.
pub struct S3Store {
    region: String,
    runtime: tokio::runtime::Runtime,
}

impl S3Store {
    pub fn new(region: impl Into<String>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            region: region.into(),
            runtime,
        })
    }

    async fn client(&self) -> aws_sdk_s3::Client {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .load()
            .await;
        aws_sdk_s3::Client::new(&config)
    }
}

impl ObjectStore for S3Store {
    fn name(&self) -> &str {
        "s3"
    }

    fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.runtime.block_on(async {
            self.client()
                .await
                .put_object()
                .bucket(bucket)
                .key(key)
                .content_type("text/csv")
                .body(ByteStream::from(body))
                .send()
                .await
                .map_err(|e| EtlError::Storage(DisplayErrorContext(e).to_string()))?;
            Ok(())
        })
    }
}

/// Check that `path` names an existing `.csv` file.
pub fn validate_upload_target(path: &Path) -> Result<()> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if !is_csv || !path.is_file() {
        return Err(EtlError::NotFound(path.to_path_buf()));
    }
    Ok(())
}

/// Upload the CSV at `path` to `bucket` as `object_name`.
///
/// The target is validated before the store is touched.
#[instrument(name = "upload_csv", skip(store), fields(store = store.name()))]
pub fn upload_csv(
    store: &dyn ObjectStore,
    bucket: &str,
    path: &Path,
    object_name: &str,
) -> Result<()> {
    validate_upload_target(path).map_err(|e| {
        error!("refusing to upload: {e}");
        e
    })?;
    let body = std::fs::read(path)?;
    info!("uploading {} bytes to bucket {bucket}", body.len());
    store.put_object(bucket, object_name, body).map_err(|e| {
        error!("upload failed: {e}");
        e
    })?;
    info!("uploaded {bucket}/{object_name}");
    Ok(())
}

/// Upload to S3 in `region`. No client is built when the target is invalid.
pub fn upload_csv_to_s3(bucket: &str, path: &Path, region: &str, object_name: &str) -> Result<()> {
    validate_upload_target(path)?;
    let store = S3Store::new(region)?;
    upload_csv(&store, bucket, path, object_name)
}
