// Database query sources, one module per driver

pub mod mysql;
pub mod oracle;
pub mod postgresql;

use crate::dataset::{Column, DataType, Dataset};
use crate::errors::SourceError;
use crate::models::DatabaseKind;
use serde_json::Value;

/// Run a query against the named database and collect the result set
pub async fn query(
    kind: DatabaseKind,
    url: &str,
    user: &str,
    password: &str,
    sql: &str,
) -> Result<Dataset, SourceError> {
    match kind {
        DatabaseKind::PostgreSql => postgresql::query(url, user, password, sql).await,
        DatabaseKind::MySql => mysql::query(url, user, password, sql).await,
        DatabaseKind::Oracle => oracle::query(url, user, password, sql).await,
    }
}

/// Assemble a dataset from driver-decoded JSON cells.
///
/// Column types are taken from the first non-null cell per column;
/// columns that are entirely NULL default to String.
pub(crate) fn dataset_from_cells(column_names: Vec<String>, rows: Vec<Vec<Value>>) -> Dataset {
    let columns = column_names
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let data_type = rows
                .iter()
                .filter_map(|row| value_data_type(&row[idx]))
                .next()
                .unwrap_or(DataType::String);
            Column::new(name, data_type)
        })
        .collect();

    Dataset::new(columns, rows)
}

fn value_data_type(value: &Value) -> Option<DataType> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(DataType::Boolean),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(DataType::Integer),
        Value::Number(_) => Some(DataType::Float),
        _ => Some(DataType::String),
    }
}
