// S3-compatible object store client (MinIO, AWS S3)

use crate::config::ObjectStoreConfig;
use crate::errors::StorageError;
use crate::storage::ObjectStore;
use async_trait::async_trait;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::region::Region;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Object store backed by a single S3 bucket
#[derive(Clone, Debug)]
pub struct S3ObjectStore {
    bucket: Arc<Bucket>,
}

impl S3ObjectStore {
    /// Create a new client from configuration
    #[instrument(skip(config), fields(endpoint = %config.endpoint, bucket = %config.bucket))]
    pub fn new(config: &ObjectStoreConfig) -> Result<Self, StorageError> {
        info!("Initializing object store client");

        // Strip scheme: rust-s3 Region::Custom doesn't expect it
        let endpoint = config
            .endpoint
            .trim_start_matches("http://")
            .trim_start_matches("https://")
            .to_string();

        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| {
            error!(error = %e, "Failed to create object store credentials");
            StorageError::Credentials(e.to_string())
        })?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint,
        };

        // Path style is what MinIO expects
        let bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| {
                error!(error = %e, "Failed to create bucket handle");
                StorageError::ObjectStore(format!("Failed to create bucket: {}", e))
            })?
            .with_path_style();

        info!(
            bucket = %config.bucket,
            endpoint = %config.endpoint,
            "Object store client initialized"
        );

        Ok(Self {
            bucket: Arc::new(bucket),
        })
    }

    /// Health check for object store connectivity
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), StorageError> {
        self.bucket
            .list("".to_string(), Some("/".to_string()))
            .await
            .map_err(|e| {
                error!(error = %e, "Object store health check failed");
                StorageError::ObjectStore(format!("Health check failed: {}", e))
            })?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self), fields(key = %key))]
    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        debug!(key = %key, "Retrieving object");

        let response = self.bucket.get_object(key).await.map_err(|e| {
            let text = e.to_string();
            if text.contains("404") || text.contains("NoSuchKey") {
                StorageError::NotFound(key.to_string())
            } else {
                error!(error = %e, key = %key, "Failed to retrieve object");
                StorageError::ObjectStore(format!("Failed to get object '{}': {}", key, e))
            }
        })?;

        let data = response.bytes().to_vec();
        debug!(key = %key, size = data.len(), "Object retrieved");
        Ok(data)
    }

    #[instrument(skip(self, data), fields(key = %key, size = data.len()))]
    async fn put_object(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        debug!(key = %key, size = data.len(), "Storing object");

        self.bucket.put_object(key, data).await.map_err(|e| {
            error!(error = %e, key = %key, "Failed to store object");
            StorageError::ObjectStore(format!("Failed to put object '{}': {}", key, e))
        })?;

        debug!(key = %key, "Object stored");
        Ok(())
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn object_exists(&self, key: &str) -> Result<bool, StorageError> {
        match self.bucket.head_object(key).await {
            Ok(_) => Ok(true),
            Err(e) => {
                let text = e.to_string();
                if text.contains("404") || text.contains("Not Found") {
                    Ok(false)
                } else {
                    error!(error = %e, key = %key, "Failed to check object existence");
                    Err(StorageError::ObjectStore(format!(
                        "Failed to check object '{}': {}",
                        key, e
                    )))
                }
            }
        }
    }
}
