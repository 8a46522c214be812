//! The main access node API.

use std::sync::Arc;

use pyr_access_core::{AccessClaim, Address, ContentId, ContentItem, PeerId, Role};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::context::PeerContext;
use crate::error::Result;
use crate::exchange::CredentialExchange;
use crate::issuer::ProofIssuer;
use crate::library::{Library, LibraryReport};
use crate::publish::{ContentUpload, Publisher};
use crate::subscription::SubscriptionManager;
use crate::verify::Verifier;

/// A peer taking part in the access-grant protocol.
///
/// Serves grants for content it can share and requests access to content
/// it is entitled to. All methods take `&self` and may run concurrently.
pub struct AccessNode {
    ctx: Arc<PeerContext>,
    issuer: ProofIssuer,
    exchange: Arc<CredentialExchange>,
    verifier: Arc<Verifier>,
    subscriptions: SubscriptionManager,
    publisher: Publisher,
    library: Library,
    grant_listener: Mutex<Option<JoinHandle<()>>>,
}

impl AccessNode {
    /// Create a node over `ctx`. Call [`AccessNode::start`] before use.
    pub fn new(ctx: PeerContext) -> Self {
        let ctx = Arc::new(ctx);
        let exchange = Arc::new(CredentialExchange::new(Arc::clone(&ctx)));
        let verifier = Arc::new(Verifier::new(Arc::clone(&ctx), Arc::clone(&exchange)));

        Self {
            issuer: ProofIssuer::new(Arc::clone(&ctx)),
            subscriptions: SubscriptionManager::new(Arc::clone(&ctx), Arc::clone(&verifier)),
            publisher: Publisher::new(Arc::clone(&ctx)),
            library: Library::new(Arc::clone(&ctx)),
            exchange,
            verifier,
            grant_listener: Mutex::new(None),
            ctx,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Register the grant protocol handler and subscribe to tracked items.
    ///
    /// Calling `start` again is a no-op.
    pub async fn start(&self) -> Result<()> {
        let mut listener = self.grant_listener.lock().await;
        if listener.is_some() {
            return Ok(());
        }

        let streams = self
            .ctx
            .transport
            .handle(&self.ctx.config.grant_protocol)
            .await?;
        *listener = Some(tokio::spawn(Arc::clone(&self.exchange).listen(streams)));
        drop(listener);

        self.resync().await?;
        tracing::info!(peer = %self.peer_id(), account = %self.account(), "access node started");
        Ok(())
    }

    /// Stop the grant listener and every topic listener.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.grant_listener.lock().await.take() {
            handle.abort();
        }
        self.subscriptions.shutdown().await;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Protocol Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Ask holders of `content_id` for its storage credentials.
    ///
    /// Tracks the item as collected, makes sure its topic is subscribed
    /// and publishes a fresh claim.
    pub async fn request_access(&self, content_id: &ContentId) -> Result<AccessClaim> {
        self.ctx.store.track(content_id, Role::Collected).await?;
        self.resync().await?;
        self.issuer.issue_claim(content_id).await
    }

    /// Publish new content and start serving grants for it.
    pub async fn publish(&self, upload: ContentUpload) -> Result<ContentId> {
        let content_id = self.publisher.publish(upload).await?;
        self.resync().await?;
        Ok(content_id)
    }

    /// Buy one token of `content_id`.
    pub async fn purchase(&self, content_id: &ContentId) -> Result<()> {
        self.publisher.purchase(content_id).await?;
        self.resync().await?;
        Ok(())
    }

    /// Rebuild the tracked library from the ledger.
    pub async fn refresh_library(&self) -> Result<LibraryReport> {
        let report = self.library.refresh().await?;
        self.resync().await?;
        Ok(report)
    }

    /// Subscribe to every tracked item not yet listened to.
    pub async fn resync(&self) -> Result<Vec<ContentId>> {
        let items = self.ctx.store.list(None).await?;
        self.subscriptions.resync(&items).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a tracked item.
    pub async fn item(&self, content_id: &ContentId) -> Result<Option<ContentItem>> {
        Ok(self.ctx.store.get(content_id).await?)
    }

    /// List tracked items, optionally only those with `role`.
    pub async fn items(&self, role: Option<Role>) -> Result<Vec<ContentItem>> {
        Ok(self.ctx.store.list(role).await?)
    }

    /// Whether the node listens for claims on `content_id`.
    pub async fn is_subscribed(&self, content_id: &ContentId) -> bool {
        self.subscriptions.is_subscribed(content_id).await
    }

    /// Number of subscribed topics.
    pub async fn subscription_count(&self) -> usize {
        self.subscriptions.len().await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Ledger account of this node.
    pub fn account(&self) -> Address {
        self.ctx.account
    }

    /// Transport identity of this node.
    pub fn peer_id(&self) -> PeerId {
        self.ctx.peer_id()
    }

    pub fn context(&self) -> &PeerContext {
        &self.ctx
    }

    pub fn issuer(&self) -> &ProofIssuer {
        &self.issuer
    }

    pub fn verifier(&self) -> &Verifier {
        &self.verifier
    }

    pub fn exchange(&self) -> &CredentialExchange {
        &self.exchange
    }
}

impl Drop for AccessNode {
    fn drop(&mut self) {
        if let Some(handle) = self.grant_listener.get_mut().take() {
            handle.abort();
        }
    }
}
