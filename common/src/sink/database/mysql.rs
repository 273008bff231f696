// MySQL table sink

use crate::dataset::{DataType, Dataset};
use crate::errors::SinkError;
use serde_json::Value;

/// Create the table if absent and insert the dataset rows
#[tracing::instrument(
    skip(url, user, password, dataset),
    fields(database_type = "mysql", table = %table, rows = dataset.row_count())
)]
pub async fn write_table(
    url: &str,
    user: &str,
    password: &str,
    table: &str,
    dataset: &Dataset,
) -> Result<(), SinkError> {
    use mysql_async::prelude::*;

    tracing::info!("Connecting to MySQL database");

    let opts = mysql_async::Opts::from_url(url)
        .map_err(|e| SinkError::ConnectionFailed(format!("Invalid MySQL connection URL: {}", e)))?;
    let opts = mysql_async::OptsBuilder::from_opts(opts)
        .user(Some(user))
        .pass(Some(password));

    let pool = mysql_async::Pool::new(opts);
    let mut conn = pool
        .get_conn()
        .await
        .map_err(|e| SinkError::ConnectionFailed(format!("Failed to connect to MySQL: {}", e)))?;

    let column_defs: Vec<String> = dataset
        .columns
        .iter()
        .map(|col| format!("`{}` {}", col.name, sql_type(col.data_type)))
        .collect();
    let create_sql = format!(
        "CREATE TABLE IF NOT EXISTS `{}` ({})",
        table,
        column_defs.join(", ")
    );

    conn.query_drop(&create_sql)
        .await
        .map_err(|e| SinkError::WriteFailed {
            location: table.to_string(),
            reason: format!("Failed to create table: {}", e),
        })?;

    let column_list: Vec<String> = dataset
        .columns
        .iter()
        .map(|col| format!("`{}`", col.name))
        .collect();
    let placeholders = vec!["?"; dataset.column_count()].join(", ");
    let insert_sql = format!(
        "INSERT INTO `{}` ({}) VALUES ({})",
        table,
        column_list.join(", "),
        placeholders
    );

    let params: Vec<mysql_async::Params> = dataset
        .rows
        .iter()
        .map(|row| {
            mysql_async::Params::Positional(row.iter().map(cell_to_value).collect())
        })
        .collect();

    if !params.is_empty() {
        conn.exec_batch(&insert_sql, params)
            .await
            .map_err(|e| SinkError::WriteFailed {
                location: table.to_string(),
                reason: format!("Failed to insert rows: {}", e),
            })?;
    }

    drop(conn);
    pool.disconnect()
        .await
        .map_err(|e| SinkError::WriteFailed {
            location: table.to_string(),
            reason: format!("Failed to disconnect from MySQL: {}", e),
        })?;

    tracing::info!("MySQL sink wrote {} rows", dataset.row_count());
    Ok(())
}

fn cell_to_value(cell: &Value) -> mysql_async::Value {
    match cell {
        Value::Null => mysql_async::Value::NULL,
        Value::Bool(b) => mysql_async::Value::from(*b),
        Value::Number(n) if n.is_i64() => mysql_async::Value::from(n.as_i64()),
        Value::Number(n) => mysql_async::Value::from(n.as_f64()),
        Value::String(s) => mysql_async::Value::from(s.as_str()),
        other => mysql_async::Value::from(other.to_string()),
    }
}

fn sql_type(data_type: DataType) -> &'static str {
    match data_type {
        DataType::String => "TEXT",
        DataType::Integer => "BIGINT",
        DataType::Float => "DOUBLE",
        DataType::Boolean => "BOOLEAN",
    }
}
