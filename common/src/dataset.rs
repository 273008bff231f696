// Tabular dataset model shared by source readers, script backends and sink writers

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scalar type of a dataset column
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    String,
    Integer,
    Float,
    Boolean,
}

/// Role a column plays in the dataset structure.
///
/// Defaults to Measure; identifier/attribute roles are assigned by the
/// script language downstream, not by this service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Identifier,
    #[default]
    Measure,
    Attribute,
}

/// Column definition in result-set order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    #[serde(default)]
    pub role: ColumnRole,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            role: ColumnRole::Measure,
        }
    }
}

/// An immutable tabular value: named, typed columns plus row-major data.
///
/// Cells are JSON scalars; `Value::Null` represents SQL NULL / missing.
/// Each row vector has the same length as `columns`. Datasets are never
/// mutated after creation — transforms produce new datasets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Dataset {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl Dataset {
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Number of data rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Zero-based index of a column by name (case-sensitive)
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Cell value at (row, column name); `None` for out-of-bounds or NULL
    pub fn get_value(&self, row: usize, col: &str) -> Option<&Value> {
        let idx = self.column_index(col)?;
        let cell = self.rows.get(row)?.get(idx)?;
        if cell.is_null() {
            None
        } else {
            Some(cell)
        }
    }

    /// Copy of this dataset capped at `limit` rows
    pub fn with_limit(&self, limit: usize) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(limit).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Dataset {
        Dataset::new(
            vec![
                Column::new("id", DataType::Integer),
                Column::new("name", DataType::String),
                Column::new("score", DataType::Float),
            ],
            vec![
                vec![json!(1), json!("alice"), json!(9.5)],
                vec![json!(2), json!("bob"), Value::Null],
                vec![json!(3), Value::Null, json!(7.0)],
            ],
        )
    }

    #[test]
    fn test_counts_and_index() {
        let ds = sample();
        assert_eq!(ds.row_count(), 3);
        assert_eq!(ds.column_count(), 3);
        assert_eq!(ds.column_index("score"), Some(2));
        assert_eq!(ds.column_index("missing"), None);
    }

    #[test]
    fn test_get_value_null_is_none() {
        let ds = sample();
        assert_eq!(ds.get_value(0, "name"), Some(&json!("alice")));
        assert_eq!(ds.get_value(1, "score"), None);
        assert_eq!(ds.get_value(9, "name"), None);
    }

    #[test]
    fn test_with_limit() {
        let ds = sample();
        let limited = ds.with_limit(2);
        assert_eq!(limited.row_count(), 2);
        assert_eq!(limited.columns, ds.columns);
        // limit beyond row count is a no-op
        assert_eq!(ds.with_limit(100).row_count(), 3);
    }

    #[test]
    fn test_serde_round_trip() {
        let ds = sample();
        let json = serde_json::to_string(&ds).unwrap();
        let back: Dataset = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ds);
    }
}
