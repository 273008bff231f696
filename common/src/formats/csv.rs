// CSV codec: ';' delimiter, header row

use crate::dataset::{Column, DataType, Dataset};
use crate::errors::{SinkError, SourceError};
use csv::{ReaderBuilder, WriterBuilder};
use serde_json::{json, Value};

const DELIMITER: u8 = b';';

/// Parse CSV bytes into a dataset.
///
/// The first record is the header; column types are inferred from the
/// data, falling back to String. Empty cells decode to NULL.
pub fn read_csv(data: &[u8]) -> Result<Dataset, SourceError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| SourceError::Decode(format!("Failed to read CSV header: {}", e)))?
        .clone();

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record =
            result.map_err(|e| SourceError::Decode(format!("Failed to parse CSV record: {}", e)))?;
        if record.len() != headers.len() {
            return Err(SourceError::Decode(format!(
                "CSV record has {} fields, header has {}",
                record.len(),
                headers.len()
            )));
        }
        raw_rows.push(record.iter().map(str::to_string).collect());
    }

    let columns: Vec<Column> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| Column::new(name, infer_column_type(&raw_rows, idx)))
        .collect();

    let rows = raw_rows
        .iter()
        .map(|raw| {
            raw.iter()
                .enumerate()
                .map(|(idx, field)| parse_cell(field, columns[idx].data_type))
                .collect()
        })
        .collect();

    Ok(Dataset::new(columns, rows))
}

/// Serialize a dataset to CSV bytes, header row first
pub fn write_csv(dataset: &Dataset) -> Result<Vec<u8>, SinkError> {
    let mut buffer = Vec::new();
    let mut writer = WriterBuilder::new()
        .delimiter(DELIMITER)
        .from_writer(&mut buffer);

    let header: Vec<&str> = dataset.columns.iter().map(|c| c.name.as_str()).collect();
    writer
        .write_record(&header)
        .map_err(|e| SinkError::Encode(format!("Failed to write CSV header: {}", e)))?;

    for row in &dataset.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| match cell {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect();
        writer
            .write_record(&cells)
            .map_err(|e| SinkError::Encode(format!("Failed to write CSV record: {}", e)))?;
    }

    writer
        .flush()
        .map_err(|e| SinkError::Encode(format!("Failed to flush CSV writer: {}", e)))?;
    drop(writer);

    Ok(buffer)
}

/// Narrowest type all non-empty cells of a column fit; String when mixed
fn infer_column_type(rows: &[Vec<String>], idx: usize) -> DataType {
    let cells = rows
        .iter()
        .map(|row| row[idx].as_str())
        .filter(|f| !f.is_empty());

    let mut seen_any = false;
    let mut all_int = true;
    let mut all_float = true;
    let mut all_bool = true;

    for field in cells {
        seen_any = true;
        all_int = all_int && field.parse::<i64>().is_ok();
        all_float = all_float && field.parse::<f64>().is_ok();
        all_bool = all_bool && field.parse::<bool>().is_ok();
    }

    if !seen_any {
        DataType::String
    } else if all_int {
        DataType::Integer
    } else if all_float {
        DataType::Float
    } else if all_bool {
        DataType::Boolean
    } else {
        DataType::String
    }
}

fn parse_cell(field: &str, data_type: DataType) -> Value {
    if field.is_empty() {
        return Value::Null;
    }
    match data_type {
        DataType::Integer => field.parse::<i64>().map(|v| json!(v)).unwrap_or(Value::Null),
        DataType::Float => field.parse::<f64>().map(|v| json!(v)).unwrap_or(Value::Null),
        DataType::Boolean => field
            .parse::<bool>()
            .map(|v| json!(v))
            .unwrap_or(Value::Null),
        DataType::String => json!(field),
    }
}
