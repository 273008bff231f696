// Oracle query source

use crate::dataset::Dataset;
use crate::errors::SourceError;
use serde_json::json;

/// Run a query over a single-use connection and collect the result set
#[tracing::instrument(skip(url, user, password, sql), fields(database_type = "oracle"))]
pub async fn query(
    url: &str,
    user: &str,
    password: &str,
    sql: &str,
) -> Result<Dataset, SourceError> {
    tracing::info!("Connecting to Oracle database");

    // Connect string format: host:port/service_name, with or without scheme
    let connect_string = url.trim_start_matches("oracle://");

    let conn = oracle::Connection::connect(user, password, connect_string).map_err(|e| {
        SourceError::ConnectionFailed(format!("Failed to connect to Oracle: {}", e))
    })?;

    let rows = conn
        .query(sql, &[])
        .map_err(|e| SourceError::QueryFailed(format!("Oracle query failed: {}", e)))?;

    let column_names: Vec<String> = rows
        .column_info()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let mut result_rows = Vec::new();
    for row_result in rows {
        let row = row_result
            .map_err(|e| SourceError::QueryFailed(format!("Failed to fetch Oracle row: {}", e)))?;

        let mut cells = Vec::with_capacity(column_names.len());
        for i in 0..column_names.len() {
            let value: serde_json::Value = if let Ok(v) = row.get::<usize, i64>(i) {
                json!(v)
            } else if let Ok(v) = row.get::<usize, f64>(i) {
                json!(v)
            } else if let Ok(v) = row.get::<usize, String>(i) {
                json!(v)
            } else {
                json!(null)
            };
            cells.push(value);
        }
        result_rows.push(cells);
    }

    conn.close().map_err(|e| {
        SourceError::QueryFailed(format!("Failed to close Oracle connection: {}", e))
    })?;

    tracing::info!("Oracle query returned {} rows", result_rows.len());
    Ok(super::dataset_from_cells(column_names, result_rows))
}
