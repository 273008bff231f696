// Dataset byte codecs for object-store files

pub mod csv;
pub mod parquet;

use crate::errors::{SinkError, SourceError};
use crate::models::FileFormat;

/// Decode raw object bytes into a dataset
pub fn decode(format: FileFormat, data: &[u8]) -> Result<crate::dataset::Dataset, SourceError> {
    match format {
        FileFormat::Csv => csv::read_csv(data),
        FileFormat::Parquet => parquet::read_parquet(data),
    }
}

/// Encode a dataset into raw object bytes
pub fn encode(
    format: FileFormat,
    dataset: &crate::dataset::Dataset,
) -> Result<Vec<u8>, SinkError> {
    match format {
        FileFormat::Csv => csv::write_csv(dataset),
        FileFormat::Parquet => parquet::write_parquet(dataset),
    }
}
