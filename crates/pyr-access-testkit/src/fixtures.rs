//! Test fixtures and helpers.
//!
//! Common setup code for multi-peer integration tests.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use bytes::Bytes;
use tempfile::TempDir;

use pyr_access::{AccessConfig, AccessNode, ContentUpload, PeerContext};
use pyr_access_core::{Address, ContentId, ContentItem, FetchState, Keypair, PeerId};
use pyr_access_net::MemoryNetwork;
use pyr_access_oracle::{FileSource, MemoryLedger, MemoryStorage, MemoryStorageNetwork};
use pyr_access_store::MemoryStore;

/// How long [`TestPeer::wait_for_state`] waits by default.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);

/// Give spawned protocol tasks time to run.
///
/// Used before asserting that something did *not* happen.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

/// One ledger, one transport network and one storage network, shared by
/// every peer created from it.
pub struct TestNetwork {
    pub ledger: Arc<MemoryLedger>,
    pub transport: Arc<MemoryNetwork>,
    pub storage: Arc<MemoryStorageNetwork>,
    dir: TempDir,
}

impl TestNetwork {
    /// Create an empty network with its ledger at block 0.
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            ledger: Arc::new(MemoryLedger::new()),
            transport: MemoryNetwork::new(),
            storage: MemoryStorageNetwork::new(),
            dir: tempfile::tempdir().context("creating peer cache root")?,
        })
    }

    /// Root of every peer's storage cache.
    pub fn cache_root(&self) -> &Path {
        self.dir.path()
    }

    /// Create and start a peer with the default configuration.
    pub async fn peer(&self, label: &str) -> anyhow::Result<TestPeer> {
        self.peer_with_config(label, AccessConfig::default()).await
    }

    /// Create and start a peer with `config`.
    ///
    /// The peer gets a fresh ledger account, a random transport identity
    /// and a storage client caching under `<cache_root>/<label>`.
    pub async fn peer_with_config(
        &self,
        label: &str,
        config: AccessConfig,
    ) -> anyhow::Result<TestPeer> {
        let account = self.ledger.add_account(Keypair::generate()).await;
        let peer_id = PeerId::random();
        let storage = Arc::new(self.storage.create_client(label, self.dir.path().join(label)));
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(self.transport.create_transport(peer_id));

        let node = AccessNode::new(PeerContext::new(
            account,
            config,
            self.ledger.clone(),
            storage.clone(),
            transport,
            store.clone(),
        ));
        node.start()
            .await
            .with_context(|| format!("starting peer {}", label))?;

        Ok(TestPeer {
            label: label.to_string(),
            account,
            peer_id,
            node,
            storage,
            store,
        })
    }
}

/// A started peer plus direct handles to its in-memory collaborators.
pub struct TestPeer {
    pub label: String,
    pub account: Address,
    pub peer_id: PeerId,
    pub node: AccessNode,
    pub storage: Arc<MemoryStorage>,
    pub store: Arc<MemoryStore>,
}

impl TestPeer {
    /// Publish a single-file content item.
    pub async fn publish_file(
        &self,
        title: &str,
        price: u128,
        name: &str,
        data: &[u8],
    ) -> anyhow::Result<ContentId> {
        let id = self
            .node
            .publish(ContentUpload {
                title: title.to_string(),
                price,
                files: vec![FileSource {
                    name: name.to_string(),
                    data: Bytes::copy_from_slice(data),
                }],
            })
            .await?;
        Ok(id)
    }

    /// Current fetch state of `id`, if tracked.
    pub async fn fetch_state(&self, id: &ContentId) -> anyhow::Result<Option<FetchState>> {
        Ok(self.node.item(id).await?.map(|item| item.fetch_state))
    }

    /// Poll until `id` reaches `state`, failing after [`DEFAULT_WAIT`].
    ///
    /// Fails early if the item settles in a different final state.
    pub async fn wait_for_state(
        &self,
        id: &ContentId,
        state: FetchState,
    ) -> anyhow::Result<ContentItem> {
        let poll = async {
            loop {
                if let Some(item) = self.node.item(id).await? {
                    if item.fetch_state == state {
                        return Ok::<_, anyhow::Error>(item);
                    }
                    if item.fetch_state.is_final() {
                        bail!("{}: {} settled in {}", self.label, id, item.fetch_state);
                    }
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };

        match tokio::time::timeout(DEFAULT_WAIT, poll).await {
            Ok(result) => result,
            Err(_) => {
                let last = self.fetch_state(id).await?;
                bail!(
                    "{}: {} never reached {} (last state {:?})",
                    self.label,
                    id,
                    state,
                    last
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_peers_are_distinct() {
        let net = TestNetwork::new().unwrap();
        let a = net.peer("a").await.unwrap();
        let b = net.peer("b").await.unwrap();

        assert_ne!(a.account, b.account);
        assert_ne!(a.peer_id, b.peer_id);
        assert_eq!(a.node.peer_id(), a.peer_id);
    }

    #[tokio::test]
    async fn test_publish_file_tracks_item() {
        let net = TestNetwork::new().unwrap();
        let publisher = net.peer("pub").await.unwrap();

        let id = publisher.publish_file("album", 5, "a.txt", b"hi").await.unwrap();
        assert_eq!(
            publisher.fetch_state(&id).await.unwrap(),
            Some(FetchState::NotRequested)
        );
        assert!(publisher.node.is_subscribed(&id).await);
    }

    #[tokio::test]
    async fn test_peer_cache_lives_under_root() {
        let net = TestNetwork::new().unwrap();
        let a = net.peer("a").await.unwrap();

        assert_eq!(a.storage.cache_dir(), net.cache_root().join("a"));
    }
}
