// MySQL query source

use crate::dataset::Dataset;
use crate::errors::SourceError;
use serde_json::json;

/// Run a query over a single-use connection and collect the result set
#[tracing::instrument(skip(url, user, password, sql), fields(database_type = "mysql"))]
pub async fn query(
    url: &str,
    user: &str,
    password: &str,
    sql: &str,
) -> Result<Dataset, SourceError> {
    use mysql_async::prelude::*;

    tracing::info!("Connecting to MySQL database");

    let opts = mysql_async::Opts::from_url(url).map_err(|e| {
        SourceError::ConnectionFailed(format!("Invalid MySQL connection URL: {}", e))
    })?;
    let opts = mysql_async::OptsBuilder::from_opts(opts)
        .user(Some(user))
        .pass(Some(password));

    let pool = mysql_async::Pool::new(opts);
    let mut conn = pool.get_conn().await.map_err(|e| {
        SourceError::ConnectionFailed(format!("Failed to connect to MySQL: {}", e))
    })?;

    let rows: Vec<mysql_async::Row> = conn
        .query(sql)
        .await
        .map_err(|e| SourceError::QueryFailed(format!("MySQL query failed: {}", e)))?;

    let column_names: Vec<String> = rows
        .first()
        .map(|row| {
            row.columns_ref()
                .iter()
                .map(|c| c.name_str().to_string())
                .collect()
        })
        .unwrap_or_default();

    let mut result_rows = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut cells = Vec::with_capacity(column_names.len());
        for i in 0..column_names.len() {
            let value: serde_json::Value = if let Some(v) = row.get::<Option<i64>, _>(i) {
                json!(v)
            } else if let Some(v) = row.get::<Option<f64>, _>(i) {
                json!(v)
            } else if let Some(v) = row.get::<Option<bool>, _>(i) {
                json!(v)
            } else if let Some(v) = row.get::<Option<String>, _>(i) {
                json!(v)
            } else {
                json!(null)
            };
            cells.push(value);
        }
        result_rows.push(cells);
    }

    drop(conn);
    pool.disconnect().await.map_err(|e| {
        SourceError::QueryFailed(format!("Failed to disconnect from MySQL: {}", e))
    })?;

    tracing::info!("MySQL query returned {} rows", result_rows.len());
    Ok(super::dataset_from_cells(column_names, result_rows))
}
