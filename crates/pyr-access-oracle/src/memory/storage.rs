//! In-memory bucket service.
//!
//! A [`MemoryStorageNetwork`] holds the shared bucket contents, keyed by
//! share key. Each peer gets its own [`MemoryStorage`] client with a local
//! bucket registry; opened entries are written under the client's cache
//! directory so a locator is a real file path.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{mpsc, RwLock};

use pyr_access_core::Locator;

use crate::error::StorageError;
use crate::storage::{
    BucketEntry, BucketHandle, BucketShare, FileSource, PutEvent, Result, Storage,
};

type Files = Arc<RwLock<BTreeMap<String, Bytes>>>;

/// Shared state of the in-memory bucket service.
#[derive(Default)]
pub struct MemoryStorageNetwork {
    shares: RwLock<HashMap<String, Files>>,
}

impl MemoryStorageNetwork {
    /// Create a new storage network.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create a storage client connected to this network.
    ///
    /// `label` names the client in bucket addresses; opened entries are
    /// written below `cache_dir`.
    pub fn create_client(
        self: &Arc<Self>,
        label: impl Into<String>,
        cache_dir: impl Into<PathBuf>,
    ) -> MemoryStorage {
        MemoryStorage {
            network: Arc::clone(self),
            label: label.into(),
            cache_dir: cache_dir.into(),
            buckets: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }
}

struct LocalBucket {
    key: String,
    files: Files,
}

/// In-memory storage client.
pub struct MemoryStorage {
    network: Arc<MemoryStorageNetwork>,
    label: String,
    cache_dir: PathBuf,
    buckets: RwLock<HashMap<String, LocalBucket>>,
    available: AtomicBool,
}

impl MemoryStorage {
    /// Make every storage call fail with `Unavailable` (or recover).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Directory opened entries are written to.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable("storage daemon offline".into()))
        }
    }

    async fn files(&self, bucket: &BucketHandle) -> Result<(String, Files)> {
        let buckets = self.buckets.read().await;
        let local = buckets
            .get(&bucket.name)
            .ok_or_else(|| StorageError::BucketNotFound(bucket.name.clone()))?;
        Ok((local.key.clone(), Arc::clone(&local.files)))
    }
}

fn entry_path(target_path: &str, name: &str) -> String {
    let dir = target_path.trim_matches('/');
    let name = name.trim_start_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create_bucket(&self, name: &str) -> Result<BucketHandle> {
        self.check_available()?;
        let mut buckets = self.buckets.write().await;
        if buckets.contains_key(name) {
            return Err(StorageError::BucketExists(name.to_string()));
        }

        let key = hex::encode(rand::random::<[u8; 16]>());
        let files: Files = Arc::new(RwLock::new(BTreeMap::new()));
        self.network
            .shares
            .write()
            .await
            .insert(key.clone(), Arc::clone(&files));
        buckets.insert(name.to_string(), LocalBucket { key, files });

        Ok(BucketHandle::new(name))
    }

    async fn put_files(
        &self,
        bucket: &BucketHandle,
        target_path: &str,
        sources: Vec<FileSource>,
    ) -> Result<mpsc::Receiver<PutEvent>> {
        self.check_available()?;
        let (_, files) = self.files(bucket).await?;
        let (tx, rx) = mpsc::channel(sources.len() + 1);

        let mut stored = files.write().await;
        for source in sources {
            if source.name.trim_matches('/').is_empty() {
                let _ = tx.send(PutEvent::Error("empty file name".into())).await;
                return Ok(rx);
            }
            let path = entry_path(target_path, &source.name);
            let bytes = source.data.len() as u64;
            stored.insert(path.clone(), source.data);
            let _ = tx.send(PutEvent::Progress { path, bytes }).await;
        }
        let _ = tx.send(PutEvent::Done).await;

        Ok(rx)
    }

    async fn share_bucket(&self, bucket: &BucketHandle) -> Result<BucketShare> {
        self.check_available()?;
        let (key, _) = self.files(bucket).await?;
        Ok(BucketShare {
            addresses: vec![format!("/memory/{}/{}", self.label, key)],
            key,
        })
    }

    async fn join_bucket(&self, name: &str, share: &BucketShare) -> Result<BucketHandle> {
        self.check_available()?;
        let mut buckets = self.buckets.write().await;
        if buckets.contains_key(name) {
            return Err(StorageError::AlreadyJoined(name.to_string()));
        }

        let files = self
            .network
            .shares
            .read()
            .await
            .get(&share.key)
            .cloned()
            .ok_or(StorageError::UnknownShare)?;
        buckets.insert(
            name.to_string(),
            LocalBucket {
                key: share.key.clone(),
                files,
            },
        );

        Ok(BucketHandle::new(name))
    }

    async fn list_entries(&self, bucket: &BucketHandle) -> Result<Vec<BucketEntry>> {
        self.check_available()?;
        let (_, files) = self.files(bucket).await?;
        let files = files.read().await;
        Ok(files
            .iter()
            .map(|(path, data)| BucketEntry {
                path: path.clone(),
                size: data.len() as u64,
            })
            .collect())
    }

    async fn open_entry(&self, bucket: &BucketHandle, path: &str) -> Result<Locator> {
        self.check_available()?;
        let (_, files) = self.files(bucket).await?;
        let data = files
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::EntryNotFound {
                bucket: bucket.name.clone(),
                path: path.to_string(),
            })?;

        let local = self.cache_dir.join(&bucket.name).join(path);
        if let Some(parent) = local.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&local, &data).await?;

        Ok(Locator::new(local.to_string_lossy()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn drain(mut rx: mpsc::Receiver<PutEvent>) -> Vec<PutEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_upload_share_join_open() {
        let dir = tempfile::tempdir().unwrap();
        let network = MemoryStorageNetwork::new();
        let publisher = network.create_client("pub", dir.path().join("pub"));
        let claimant = network.create_client("claim", dir.path().join("claim"));

        let bucket = publisher.create_bucket("album").await.unwrap();
        let events = drain(
            publisher
                .put_files(
                    &bucket,
                    "/",
                    vec![FileSource {
                        name: "track.flac".into(),
                        data: Bytes::from_static(b"audio"),
                    }],
                )
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(events.last(), Some(&PutEvent::Done));

        let share = publisher.share_bucket(&bucket).await.unwrap();
        let joined = claimant.join_bucket("album", &share).await.unwrap();

        let entries = claimant.list_entries(&joined).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "track.flac");

        let locator = claimant.open_entry(&joined, "track.flac").await.unwrap();
        let bytes = tokio::fs::read(locator.as_str()).await.unwrap();
        assert_eq!(bytes, b"audio");
    }

    #[tokio::test]
    async fn test_second_join_reports_already_joined() {
        let dir = tempfile::tempdir().unwrap();
        let network = MemoryStorageNetwork::new();
        let publisher = network.create_client("pub", dir.path());
        let claimant = network.create_client("claim", dir.path());

        let bucket = publisher.create_bucket("b").await.unwrap();
        let share = publisher.share_bucket(&bucket).await.unwrap();

        claimant.join_bucket("b", &share).await.unwrap();
        let err = claimant.join_bucket("b", &share).await.unwrap_err();
        assert!(err.is_already_joined());
    }

    #[tokio::test]
    async fn test_join_unknown_share_fails() {
        let dir = tempfile::tempdir().unwrap();
        let network = MemoryStorageNetwork::new();
        let claimant = network.create_client("claim", dir.path());

        let share = BucketShare {
            key: "nope".into(),
            addresses: vec![],
        };
        assert!(matches!(
            claimant.join_bucket("b", &share).await,
            Err(StorageError::UnknownShare)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_bucket_name_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let network = MemoryStorageNetwork::new();
        let client = network.create_client("pub", dir.path());

        client.create_bucket("b").await.unwrap();
        assert!(matches!(
            client.create_bucket("b").await,
            Err(StorageError::BucketExists(_))
        ));
    }

    #[test]
    fn test_entry_path_joins_target() {
        assert_eq!(entry_path("/", "a.txt"), "a.txt");
        assert_eq!(entry_path("/docs/", "a.txt"), "docs/a.txt");
        assert_eq!(entry_path("", "/a.txt"), "a.txt");
    }
}
