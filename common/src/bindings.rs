// Input binding resolution with an explicit partial-failure policy

use crate::config::PartialBindingPolicy;
use crate::errors::SourceError;
use crate::models::{Bindings, InputDescriptor};
use crate::source::SourceReader;
use futures::future::join_all;
use std::collections::HashMap;
use tracing::{instrument, warn};

/// Loads all declared inputs for a job
#[derive(Clone)]
pub struct BindingResolver {
    reader: SourceReader,
    policy: PartialBindingPolicy,
}

impl BindingResolver {
    pub fn new(reader: SourceReader, policy: PartialBindingPolicy) -> Self {
        Self { reader, policy }
    }

    /// Resolve each named input to a dataset. Inputs load concurrently.
    ///
    /// Under `OmitFailed` a load failure drops that name from the result;
    /// under `Strict` any failure aborts resolution.
    #[instrument(skip(self, inputs), fields(inputs = inputs.len(), policy = ?self.policy))]
    pub async fn resolve(
        &self,
        inputs: &HashMap<String, InputDescriptor>,
    ) -> Result<Bindings, SourceError> {
        let loads = inputs.iter().map(|(name, descriptor)| async move {
            (name, self.reader.load(descriptor, None).await)
        });

        let mut bindings = Bindings::new();
        for (name, result) in join_all(loads).await {
            match result {
                Ok(dataset) => {
                    bindings.insert(name.clone(), dataset);
                }
                Err(e) => match self.policy {
                    PartialBindingPolicy::OmitFailed => {
                        warn!(binding = %name, error = %e, "Input binding failed to load, omitting");
                    }
                    PartialBindingPolicy::Strict => return Err(e),
                },
            }
        }

        Ok(bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileFormat;
    use crate::storage::{MemoryObjectStore, ObjectStore};
    use std::sync::Arc;

    fn file_input(url: &str) -> InputDescriptor {
        InputDescriptor::File {
            url: url.to_string(),
            filetype: FileFormat::Csv,
        }
    }

    async fn store_with_one_file() -> Arc<MemoryObjectStore> {
        let store = Arc::new(MemoryObjectStore::new());
        store
            .put_object("data/good.csv", b"id\n1\n2\n")
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_omit_failed_keeps_remaining_bindings() {
        let store = store_with_one_file().await;
        let resolver = BindingResolver::new(
            SourceReader::new(store),
            PartialBindingPolicy::OmitFailed,
        );

        let mut inputs = HashMap::new();
        inputs.insert("good".to_string(), file_input("s3://b/data/good.csv"));
        inputs.insert("bad".to_string(), file_input("s3://b/data/missing.csv"));

        let bindings = resolver.resolve(&inputs).await.unwrap();
        assert_eq!(bindings.len(), 1);
        assert!(bindings.contains_key("good"));
    }

    #[tokio::test]
    async fn test_strict_aborts_on_first_failure() {
        let store = store_with_one_file().await;
        let resolver =
            BindingResolver::new(SourceReader::new(store), PartialBindingPolicy::Strict);

        let mut inputs = HashMap::new();
        inputs.insert("bad".to_string(), file_input("s3://b/data/missing.csv"));

        assert!(resolver.resolve(&inputs).await.is_err());
    }

    #[tokio::test]
    async fn test_no_inputs_resolves_empty() {
        let store = store_with_one_file().await;
        let resolver = BindingResolver::new(
            SourceReader::new(store),
            PartialBindingPolicy::OmitFailed,
        );

        let bindings = resolver.resolve(&HashMap::new()).await.unwrap();
        assert!(bindings.is_empty());
    }
}
