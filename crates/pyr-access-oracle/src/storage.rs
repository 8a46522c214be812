//! Storage oracle: content-addressed buckets holding the actual bytes.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use pyr_access_core::Locator;

use crate::error::StorageError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Reference to a bucket known to the local storage client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketHandle {
    pub name: String,
}

impl BucketHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Credentials that let another peer join a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketShare {
    /// Bucket access key.
    pub key: String,
    /// Reachability addresses of the bucket's replicas.
    pub addresses: Vec<String>,
}

/// A file to upload.
#[derive(Debug, Clone)]
pub struct FileSource {
    /// File name, relative to the upload's target path.
    pub name: String,
    pub data: Bytes,
}

/// Progress of an upload started with [`Storage::put_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutEvent {
    /// One file has been stored.
    Progress { path: String, bytes: u64 },
    /// The upload failed; no further events follow.
    Error(String),
    /// Every file has been stored.
    Done,
}

/// One stored entry of a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketEntry {
    pub path: String,
    pub size: u64,
}

/// The Storage trait: async interface to the bucket service.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Create a new, empty bucket.
    async fn create_bucket(&self, name: &str) -> Result<BucketHandle>;

    /// Upload files under `target_path`.
    ///
    /// Returns a stream of progress events that ends with `Done` or `Error`.
    async fn put_files(
        &self,
        bucket: &BucketHandle,
        target_path: &str,
        sources: Vec<FileSource>,
    ) -> Result<mpsc::Receiver<PutEvent>>;

    /// Produce credentials for joining `bucket`.
    async fn share_bucket(&self, bucket: &BucketHandle) -> Result<BucketShare>;

    /// Join a bucket shared by another peer, registering it locally as `name`.
    ///
    /// Fails with [`StorageError::AlreadyJoined`] if `name` is already known.
    async fn join_bucket(&self, name: &str, share: &BucketShare) -> Result<BucketHandle>;

    /// List the entries stored in a bucket, ordered by path.
    async fn list_entries(&self, bucket: &BucketHandle) -> Result<Vec<BucketEntry>>;

    /// Open an entry, returning its resolved local location.
    async fn open_entry(&self, bucket: &BucketHandle, path: &str) -> Result<Locator>;
}
