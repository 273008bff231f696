// Object-store file sink

use crate::dataset::Dataset;
use crate::errors::SinkError;
use crate::formats;
use crate::models::FileFormat;
use crate::storage::{object_key, ObjectStore};
use tracing::{debug, instrument};

/// Encode a dataset and store it at the descriptor URL
#[instrument(skip(store, dataset), fields(url = %url, format = %format, rows = dataset.row_count()))]
pub async fn write_file(
    store: &dyn ObjectStore,
    url: &str,
    format: FileFormat,
    dataset: &Dataset,
) -> Result<(), SinkError> {
    let key = object_key(url);
    let data = formats::encode(format, dataset)?;

    store.put_object(key, &data).await?;

    debug!(key = %key, size = data.len(), "File sink written");
    Ok(())
}
