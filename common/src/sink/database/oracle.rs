// Oracle table sink

use crate::dataset::{DataType, Dataset};
use crate::errors::SinkError;
use serde_json::Value;

/// Create the table if absent and insert the dataset rows
#[tracing::instrument(
    skip(url, user, password, dataset),
    fields(database_type = "oracle", table = %table, rows = dataset.row_count())
)]
pub async fn write_table(
    url: &str,
    user: &str,
    password: &str,
    table: &str,
    dataset: &Dataset,
) -> Result<(), SinkError> {
    tracing::info!("Connecting to Oracle database");

    let connect_string = url.trim_start_matches("oracle://");
    let conn = oracle::Connection::connect(user, password, connect_string)
        .map_err(|e| SinkError::ConnectionFailed(format!("Failed to connect to Oracle: {}", e)))?;

    // Oracle has no CREATE TABLE IF NOT EXISTS; ignore "name already used"
    let column_defs: Vec<String> = dataset
        .columns
        .iter()
        .map(|col| format!("{} {}", col.name, sql_type(col.data_type)))
        .collect();
    let create_sql = format!("CREATE TABLE {} ({})", table, column_defs.join(", "));

    if let Err(e) = conn.execute(&create_sql, &[]) {
        let already_exists = e.to_string().contains("ORA-00955");
        if !already_exists {
            return Err(SinkError::WriteFailed {
                location: table.to_string(),
                reason: format!("Failed to create table: {}", e),
            });
        }
    }

    let column_list: Vec<&str> = dataset.columns.iter().map(|c| c.name.as_str()).collect();
    let placeholders: Vec<String> = (1..=dataset.column_count())
        .map(|i| format!(":{}", i))
        .collect();
    let insert_sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        column_list.join(", "),
        placeholders.join(", ")
    );

    for row in &dataset.rows {
        let bound: Vec<Box<dyn oracle::sql_type::ToSql>> = row
            .iter()
            .zip(&dataset.columns)
            .map(|(cell, col)| cell_to_sql(cell, col.data_type))
            .collect();
        let refs: Vec<&dyn oracle::sql_type::ToSql> =
            bound.iter().map(|b| b.as_ref()).collect();

        conn.execute(&insert_sql, &refs)
            .map_err(|e| SinkError::WriteFailed {
                location: table.to_string(),
                reason: format!("Failed to insert row: {}", e),
            })?;
    }

    conn.commit().map_err(|e| SinkError::WriteFailed {
        location: table.to_string(),
        reason: format!("Failed to commit: {}", e),
    })?;

    conn.close().map_err(|e| SinkError::WriteFailed {
        location: table.to_string(),
        reason: format!("Failed to close Oracle connection: {}", e),
    })?;

    tracing::info!("Oracle sink wrote {} rows", dataset.row_count());
    Ok(())
}

fn cell_to_sql(cell: &Value, data_type: DataType) -> Box<dyn oracle::sql_type::ToSql> {
    match data_type {
        DataType::Integer => Box::new(cell.as_i64()),
        DataType::Float => Box::new(cell.as_f64()),
        // NUMBER(1) column, 0/1
        DataType::Boolean => Box::new(cell.as_bool().map(i64::from)),
        DataType::String => Box::new(cell.as_str().map(str::to_string)),
    }
}

fn sql_type(data_type: DataType) -> &'static str {
    match data_type {
        DataType::String => "VARCHAR2(4000)",
        DataType::Integer => "NUMBER(19)",
        DataType::Float => "BINARY_DOUBLE",
        DataType::Boolean => "NUMBER(1)",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_type_mapping() {
        assert_eq!(sql_type(DataType::String), "VARCHAR2(4000)");
        assert_eq!(sql_type(DataType::Boolean), "NUMBER(1)");
    }
}
