// PostgreSQL query source

use crate::dataset::Dataset;
use crate::errors::SourceError;
use chrono::Utc;
use serde_json::json;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Column, Row};
use std::str::FromStr;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Run a query over a single-use connection and collect the result set
#[tracing::instrument(skip(url, user, password, sql), fields(database_type = "postgresql"))]
pub async fn query(
    url: &str,
    user: &str,
    password: &str,
    sql: &str,
) -> Result<Dataset, SourceError> {
    tracing::info!("Connecting to PostgreSQL database");

    let options = PgConnectOptions::from_str(url)
        .map_err(|e| {
            SourceError::ConnectionFailed(format!("Invalid PostgreSQL connection URL: {}", e))
        })?
        .username(user)
        .password(password);

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(CONNECT_TIMEOUT)
        .connect_with(options)
        .await
        .map_err(|e| {
            SourceError::ConnectionFailed(format!("Failed to connect to PostgreSQL: {}", e))
        })?;

    let rows = sqlx::query(sql)
        .fetch_all(&pool)
        .await
        .map_err(|e| SourceError::QueryFailed(format!("PostgreSQL query failed: {}", e)))?;

    let column_names: Vec<String> = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();

    let mut result_rows = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut cells = Vec::with_capacity(column_names.len());
        for i in 0..column_names.len() {
            let value: serde_json::Value = if let Ok(v) = row.try_get::<i32, _>(i) {
                json!(v)
            } else if let Ok(v) = row.try_get::<i64, _>(i) {
                json!(v)
            } else if let Ok(v) = row.try_get::<f64, _>(i) {
                json!(v)
            } else if let Ok(v) = row.try_get::<bool, _>(i) {
                json!(v)
            } else if let Ok(v) = row.try_get::<String, _>(i) {
                json!(v)
            } else if let Ok(v) = row.try_get::<chrono::NaiveDateTime, _>(i) {
                json!(v.to_string())
            } else if let Ok(v) = row.try_get::<chrono::DateTime<Utc>, _>(i) {
                json!(v.to_rfc3339())
            } else if let Ok(v) = row.try_get::<serde_json::Value, _>(i) {
                v
            } else {
                row.try_get::<Option<String>, _>(i)
                    .ok()
                    .flatten()
                    .map(|s| json!(s))
                    .unwrap_or(json!(null))
            };
            cells.push(value);
        }
        result_rows.push(cells);
    }

    pool.close().await;

    tracing::info!("PostgreSQL query returned {} rows", result_rows.len());
    Ok(super::dataset_from_cells(column_names, result_rows))
}
