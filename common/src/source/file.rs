// Object-store file source

use crate::dataset::Dataset;
use crate::errors::SourceError;
use crate::formats;
use crate::models::FileFormat;
use crate::storage::{object_key, ObjectStore};
use tracing::{debug, instrument};

/// Read and decode a file from the object store
#[instrument(skip(store), fields(url = %url, format = %format))]
pub async fn read_file(
    store: &dyn ObjectStore,
    url: &str,
    format: FileFormat,
) -> Result<Dataset, SourceError> {
    let key = object_key(url);
    debug!(key = %key, "Loading file source");

    let data = store.get_object(key).await?;
    let dataset = formats::decode(format, &data)?;

    debug!(
        key = %key,
        rows = dataset.row_count(),
        columns = dataset.column_count(),
        "File source loaded"
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryObjectStore;

    #[tokio::test]
    async fn test_read_parquet_file() {
        use crate::dataset::{Column, DataType};
        use serde_json::json;

        let ds = Dataset::new(
            vec![Column::new("id", DataType::Integer)],
            vec![vec![json!(7)]],
        );
        let bytes = formats::encode(FileFormat::Parquet, &ds).unwrap();

        let store = MemoryObjectStore::new();
        store.put_object("out/x.parquet", &bytes).await.unwrap();

        let back = read_file(&store, "s3://bucket/out/x.parquet", FileFormat::Parquet)
            .await
            .unwrap();
        assert_eq!(back.rows, ds.rows);
    }

    #[tokio::test]
    async fn test_read_corrupt_file_is_decode_error() {
        let store = MemoryObjectStore::new();
        store.put_object("bad.parquet", b"garbage").await.unwrap();

        let err = read_file(&store, "bad.parquet", FileFormat::Parquet)
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
    }
}
