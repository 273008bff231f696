// Input binding resolution: query sources and object-store file sources

pub mod database;
pub mod file;

use crate::dataset::Dataset;
use crate::errors::SourceError;
use crate::models::InputDescriptor;
use crate::storage::ObjectStore;
use std::sync::Arc;
use tracing::instrument;

/// Loads datasets from the locations named by input descriptors
#[derive(Clone)]
pub struct SourceReader {
    store: Arc<dyn ObjectStore>,
}

impl SourceReader {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Load the dataset a descriptor points at, capped at `limit` rows
    /// when given
    #[instrument(skip(self, descriptor))]
    pub async fn load(
        &self,
        descriptor: &InputDescriptor,
        limit: Option<usize>,
    ) -> Result<Dataset, SourceError> {
        let dataset = match descriptor {
            InputDescriptor::Query {
                dbtype,
                url,
                user,
                password,
                query,
            } => database::query(*dbtype, url, user, password, query).await?,
            InputDescriptor::File { url, filetype } => {
                file::read_file(self.store.as_ref(), url, *filetype).await?
            }
        };

        Ok(match limit {
            Some(limit) if dataset.row_count() > limit => dataset.with_limit(limit),
            _ => dataset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileFormat;
    use crate::storage::MemoryObjectStore;

    #[tokio::test]
    async fn test_load_csv_file_with_limit() {
        let store = MemoryObjectStore::new();
        store
            .put_object("data/in.csv", b"id;name\n1;a\n2;b\n3;c\n")
            .await
            .unwrap();

        let reader = SourceReader::new(Arc::new(store));
        let descriptor = InputDescriptor::File {
            url: "s3://bucket/data/in.csv".to_string(),
            filetype: FileFormat::Csv,
        };

        let full = reader.load(&descriptor, None).await.unwrap();
        assert_eq!(full.row_count(), 3);

        let limited = reader.load(&descriptor, Some(2)).await.unwrap();
        assert_eq!(limited.row_count(), 2);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_read_failed() {
        let reader = SourceReader::new(Arc::new(MemoryObjectStore::new()));
        let descriptor = InputDescriptor::File {
            url: "s3://bucket/missing.csv".to_string(),
            filetype: FileFormat::Csv,
        };

        let err = reader.load(&descriptor, None).await.unwrap_err();
        assert!(matches!(err, SourceError::ReadFailed { .. }));
    }
}
