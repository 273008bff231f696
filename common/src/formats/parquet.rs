// Parquet codec backed by arrow record batches

use crate::dataset::{Column, DataType, Dataset};
use crate::errors::{SinkError, SourceError};
use arrow::array::{Array, ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType as ArrowType, Field, Schema};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use serde_json::{json, Value};
use std::sync::Arc;

/// Parse parquet bytes into a dataset
pub fn read_parquet(data: &[u8]) -> Result<Dataset, SourceError> {
    let bytes = Bytes::copy_from_slice(data);
    let builder = ParquetRecordBatchReaderBuilder::try_new(bytes)
        .map_err(|e| SourceError::Decode(format!("Failed to open parquet data: {}", e)))?;

    let schema = builder.schema().clone();
    let reader = builder
        .build()
        .map_err(|e| SourceError::Decode(format!("Failed to build parquet reader: {}", e)))?;

    let columns: Vec<Column> = schema
        .fields()
        .iter()
        .map(|field| Column::new(field.name().as_str(), arrow_to_data_type(field.data_type())))
        .collect();

    let mut rows = Vec::new();
    for batch in reader {
        let batch =
            batch.map_err(|e| SourceError::Decode(format!("Failed to read record batch: {}", e)))?;
        for row_idx in 0..batch.num_rows() {
            let row = batch
                .columns()
                .iter()
                .map(|array| cell_value(array, row_idx))
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }
    }

    Ok(Dataset::new(columns, rows))
}

/// Serialize a dataset to parquet bytes
pub fn write_parquet(dataset: &Dataset) -> Result<Vec<u8>, SinkError> {
    if dataset.columns.is_empty() {
        return Err(SinkError::Encode(
            "Cannot encode a dataset with no columns".to_string(),
        ));
    }

    let schema = Arc::new(build_schema(&dataset.columns));
    let arrays = build_arrays(dataset)?;
    let batch = RecordBatch::try_new(schema.clone(), arrays)
        .map_err(|e| SinkError::Encode(format!("Failed to build record batch: {}", e)))?;

    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, schema, None)
        .map_err(|e| SinkError::Encode(format!("Failed to create parquet writer: {}", e)))?;
    writer
        .write(&batch)
        .map_err(|e| SinkError::Encode(format!("Failed to write record batch: {}", e)))?;
    writer
        .close()
        .map_err(|e| SinkError::Encode(format!("Failed to finalize parquet data: {}", e)))?;

    Ok(buffer)
}

fn build_schema(columns: &[Column]) -> Schema {
    let fields: Vec<Field> = columns
        .iter()
        .map(|col| Field::new(&col.name, data_type_to_arrow(col.data_type), true))
        .collect();
    Schema::new(fields)
}

fn build_arrays(dataset: &Dataset) -> Result<Vec<ArrayRef>, SinkError> {
    let mut arrays = Vec::with_capacity(dataset.columns.len());

    for (idx, col) in dataset.columns.iter().enumerate() {
        // Rows shorter than the column list contribute nulls
        let cells = dataset.rows.iter().map(|row| row.get(idx));
        let array: ArrayRef = match col.data_type {
            DataType::Integer => {
                let mut builder = Int64Builder::new();
                for cell in cells {
                    builder.append_option(cell.and_then(Value::as_i64));
                }
                Arc::new(builder.finish())
            }
            DataType::Float => {
                let mut builder = Float64Builder::new();
                for cell in cells {
                    builder.append_option(cell.and_then(Value::as_f64));
                }
                Arc::new(builder.finish())
            }
            DataType::Boolean => {
                let mut builder = BooleanBuilder::new();
                for cell in cells {
                    builder.append_option(cell.and_then(Value::as_bool));
                }
                Arc::new(builder.finish())
            }
            DataType::String => {
                let mut builder = StringBuilder::new();
                for cell in cells {
                    builder.append_option(cell.and_then(Value::as_str));
                }
                Arc::new(builder.finish())
            }
        };
        arrays.push(array);
    }

    Ok(arrays)
}

fn data_type_to_arrow(data_type: DataType) -> ArrowType {
    match data_type {
        DataType::String => ArrowType::Utf8,
        DataType::Integer => ArrowType::Int64,
        DataType::Float => ArrowType::Float64,
        DataType::Boolean => ArrowType::Boolean,
    }
}

fn arrow_to_data_type(arrow_type: &ArrowType) -> DataType {
    match arrow_type {
        ArrowType::Int8
        | ArrowType::Int16
        | ArrowType::Int32
        | ArrowType::Int64
        | ArrowType::UInt8
        | ArrowType::UInt16
        | ArrowType::UInt32
        | ArrowType::UInt64 => DataType::Integer,
        ArrowType::Float16 | ArrowType::Float32 | ArrowType::Float64 => DataType::Float,
        ArrowType::Boolean => DataType::Boolean,
        _ => DataType::String,
    }
}

fn cell_value(array: &ArrayRef, row: usize) -> Result<Value, SourceError> {
    use arrow::array::{BooleanArray, Float64Array, Int64Array, StringArray};

    if array.is_null(row) {
        return Ok(Value::Null);
    }

    if let Some(ints) = array.as_any().downcast_ref::<Int64Array>() {
        return Ok(json!(ints.value(row)));
    }
    if let Some(floats) = array.as_any().downcast_ref::<Float64Array>() {
        return Ok(json!(floats.value(row)));
    }
    if let Some(bools) = array.as_any().downcast_ref::<BooleanArray>() {
        return Ok(json!(bools.value(row)));
    }
    if let Some(strings) = array.as_any().downcast_ref::<StringArray>() {
        return Ok(json!(strings.value(row)));
    }

    // Anything outside the four scalar types is rendered as text
    arrow::util::display::array_value_to_string(array, row)
        .map(|s| json!(s))
        .map_err(|e| SourceError::Decode(format!("Unsupported parquet value: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new(
            vec![
                Column::new("id", DataType::Integer),
                Column::new("name", DataType::String),
                Column::new("score", DataType::Float),
                Column::new("active", DataType::Boolean),
            ],
            vec![
                vec![json!(1), json!("alice"), json!(9.5), json!(true)],
                vec![json!(2), Value::Null, json!(7.25), json!(false)],
            ],
        )
    }

    #[test]
    fn test_round_trip_preserves_types_and_nulls() {
        let ds = sample();
        let bytes = write_parquet(&ds).unwrap();
        let back = read_parquet(&bytes).unwrap();

        assert_eq!(back.columns, ds.columns);
        assert_eq!(back.rows, ds.rows);
    }

    #[test]
    fn test_empty_rows_round_trip() {
        let ds = Dataset::new(vec![Column::new("id", DataType::Integer)], vec![]);
        let bytes = write_parquet(&ds).unwrap();
        let back = read_parquet(&bytes).unwrap();
        assert!(back.is_empty());
        assert_eq!(back.columns, ds.columns);
    }

    #[test]
    fn test_short_row_encodes_missing_cells_as_null() {
        let ds = Dataset::new(
            vec![
                Column::new("id", DataType::Integer),
                Column::new("name", DataType::String),
            ],
            vec![vec![json!(1), json!("alice")], vec![json!(2)]],
        );

        let bytes = write_parquet(&ds).unwrap();
        let back = read_parquet(&bytes).unwrap();

        assert_eq!(back.rows[0], vec![json!(1), json!("alice")]);
        assert_eq!(back.rows[1], vec![json!(2), Value::Null]);
    }

    #[test]
    fn test_no_columns_is_error() {
        let ds = Dataset::default();
        assert!(write_parquet(&ds).is_err());
    }

    #[test]
    fn test_garbage_bytes_is_decode_error() {
        let err = read_parquet(b"not parquet").unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
    }
}
