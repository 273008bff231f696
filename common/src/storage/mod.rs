// Object storage abstraction over an S3-compatible store
//
// File descriptors address objects by URL; the bucket comes from service
// configuration, so only the key part of the URL is used.

pub mod memory;
pub mod s3;

use crate::errors::StorageError;
use async_trait::async_trait;

pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

/// Byte-level object access used by file sources and sinks
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Retrieve the full object at `key`
    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Store `data` at `key`, replacing any existing object
    async fn put_object(&self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Check whether an object exists at `key`
    async fn object_exists(&self, key: &str) -> Result<bool, StorageError>;
}

/// Extract the object key from a descriptor URL.
///
/// Accepts `s3://bucket/path/to/object`, `http(s)://host/path` or a bare
/// key; everything up to and including the first path segment after the
/// scheme's authority is treated as bucket/host and stripped.
pub fn object_key(url: &str) -> &str {
    for scheme in ["s3://", "http://", "https://"] {
        if let Some(rest) = url.strip_prefix(scheme) {
            return match rest.split_once('/') {
                Some((_authority, key)) => key,
                None => rest,
            };
        }
    }
    url.trim_start_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_strips_s3_bucket() {
        assert_eq!(object_key("s3://my-bucket/data/in.csv"), "data/in.csv");
    }

    #[test]
    fn test_object_key_strips_http_host() {
        assert_eq!(
            object_key("http://minio:9000/out/result.parquet"),
            "out/result.parquet"
        );
    }

    #[test]
    fn test_object_key_bare_key_unchanged() {
        assert_eq!(object_key("data/in.csv"), "data/in.csv");
        assert_eq!(object_key("/data/in.csv"), "data/in.csv");
    }
}
