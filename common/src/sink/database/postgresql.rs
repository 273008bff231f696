// PostgreSQL table sink

use crate::dataset::{DataType, Dataset};
use crate::errors::SinkError;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Create the table if absent and insert the dataset rows
#[tracing::instrument(
    skip(url, user, password, dataset),
    fields(database_type = "postgresql", table = %table, rows = dataset.row_count())
)]
pub async fn write_table(
    url: &str,
    user: &str,
    password: &str,
    table: &str,
    dataset: &Dataset,
) -> Result<(), SinkError> {
    tracing::info!("Connecting to PostgreSQL database");

    let options = PgConnectOptions::from_str(url)
        .map_err(|e| {
            SinkError::ConnectionFailed(format!("Invalid PostgreSQL connection URL: {}", e))
        })?
        .username(user)
        .password(password);

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(CONNECT_TIMEOUT)
        .connect_with(options)
        .await
        .map_err(|e| {
            SinkError::ConnectionFailed(format!("Failed to connect to PostgreSQL: {}", e))
        })?;

    let column_defs: Vec<String> = dataset
        .columns
        .iter()
        .map(|col| format!("\"{}\" {}", col.name, sql_type(col.data_type)))
        .collect();
    let create_sql = format!(
        "CREATE TABLE IF NOT EXISTS \"{}\" ({})",
        table,
        column_defs.join(", ")
    );

    sqlx::query(&create_sql)
        .execute(&pool)
        .await
        .map_err(|e| SinkError::WriteFailed {
            location: table.to_string(),
            reason: format!("Failed to create table: {}", e),
        })?;

    let column_list: Vec<String> = dataset
        .columns
        .iter()
        .map(|col| format!("\"{}\"", col.name))
        .collect();
    let placeholders: Vec<String> = (1..=dataset.column_count())
        .map(|i| format!("${}", i))
        .collect();
    let insert_sql = format!(
        "INSERT INTO \"{}\" ({}) VALUES ({})",
        table,
        column_list.join(", "),
        placeholders.join(", ")
    );

    for row in &dataset.rows {
        let mut query = sqlx::query(&insert_sql);
        for (cell, col) in row.iter().zip(&dataset.columns) {
            query = match col.data_type {
                DataType::Integer => query.bind(cell.as_i64()),
                DataType::Float => query.bind(cell.as_f64()),
                DataType::Boolean => query.bind(cell.as_bool()),
                DataType::String => query.bind(cell.as_str().map(str::to_string)),
            };
        }
        query
            .execute(&pool)
            .await
            .map_err(|e| SinkError::WriteFailed {
                location: table.to_string(),
                reason: format!("Failed to insert row: {}", e),
            })?;
    }

    pool.close().await;

    tracing::info!("PostgreSQL sink wrote {} rows", dataset.row_count());
    Ok(())
}

fn sql_type(data_type: DataType) -> &'static str {
    match data_type {
        DataType::String => "TEXT",
        DataType::Integer => "BIGINT",
        DataType::Float => "DOUBLE PRECISION",
        DataType::Boolean => "BOOLEAN",
    }
}
