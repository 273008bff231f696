// Database table sinks, one module per driver.
//
// Each writer creates the table if it does not exist, then inserts the
// dataset rows. Table and column names come from caller descriptors, so
// they are restricted to plain identifiers rather than interpolated raw.

pub mod mysql;
pub mod oracle;
pub mod postgresql;

use crate::dataset::Dataset;
use crate::errors::SinkError;
use crate::models::DatabaseKind;

/// Write a dataset into the named table of the target database
pub async fn write_table(
    kind: DatabaseKind,
    url: &str,
    user: &str,
    password: &str,
    table: &str,
    dataset: &Dataset,
) -> Result<(), SinkError> {
    check_identifier(table)?;
    for col in &dataset.columns {
        check_identifier(&col.name)?;
    }

    match kind {
        DatabaseKind::PostgreSql => {
            postgresql::write_table(url, user, password, table, dataset).await
        }
        DatabaseKind::MySql => mysql::write_table(url, user, password, table, dataset).await,
        DatabaseKind::Oracle => oracle::write_table(url, user, password, table, dataset).await,
    }
}

/// Identifiers are interpolated into DDL/DML and must stay plain:
/// ASCII alphanumerics and underscores, not starting with a digit
pub(crate) fn check_identifier(name: &str) -> Result<(), SinkError> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(SinkError::WriteFailed {
            location: name.to_string(),
            reason: "invalid identifier".to_string(),
        })
    }
}
