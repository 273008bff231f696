// Output binding persistence: database tables and object-store files

pub mod database;
pub mod file;

use crate::dataset::Dataset;
use crate::errors::SinkError;
use crate::models::OutputDescriptor;
use crate::storage::{object_key, ObjectStore};
use std::sync::Arc;
use tracing::instrument;

/// Writes datasets to the locations named by output descriptors
#[derive(Clone)]
pub struct SinkWriter {
    store: Arc<dyn ObjectStore>,
}

impl SinkWriter {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Persist a dataset to the descriptor's destination
    #[instrument(skip(self, dataset, descriptor), fields(location = %descriptor.location()))]
    pub async fn persist(
        &self,
        dataset: &Dataset,
        descriptor: &OutputDescriptor,
    ) -> Result<(), SinkError> {
        match descriptor {
            OutputDescriptor::Table {
                dbtype,
                url,
                user,
                password,
                table,
                role_url,
            } => {
                database::write_table(*dbtype, url, user, password, table, dataset).await?;
                if let Some(role_url) = role_url {
                    self.write_roles(dataset, role_url).await?;
                }
                Ok(())
            }
            OutputDescriptor::File { url, filetype } => {
                file::write_file(self.store.as_ref(), url, *filetype, dataset).await
            }
        }
    }

    /// Companion structure file for table sinks: one record per column with
    /// its role and type, so downstream consumers can rebuild the dataset
    /// structure the table itself cannot carry
    async fn write_roles(&self, dataset: &Dataset, role_url: &str) -> Result<(), SinkError> {
        let mut buffer = String::from("name;role;type\n");
        for col in &dataset.columns {
            let role = serde_json::to_value(col.role)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            let data_type = serde_json::to_value(col.data_type)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            buffer.push_str(&format!("{};{};{}\n", col.name, role, data_type));
        }

        self.store
            .put_object(object_key(role_url), buffer.as_bytes())
            .await?;
        Ok(())
    }
}
