//! Credential Exchange: sends grant packages and acts on received ones.
//!
//! The granting side shares the storage bucket and writes the package to
//! the claimant over a direct stream. The receiving side joins the bucket,
//! opens its first entry and records where the content now lives.

use std::sync::Arc;

use bytes::Bytes;
use pyr_access_core::{ContentId, FetchState, GrantPackage, Locator, PeerId};
use pyr_access_net::{InboundStream, StreamListener};
use pyr_access_oracle::{BucketHandle, BucketShare};
use pyr_access_store::StoreError;
use tracing::Instrument;

use crate::context::PeerContext;
use crate::error::{AccessError, Result};

/// Result of handling one inbound grant package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The bucket was joined and the content opened.
    Ready(Locator),
    /// No request was outstanding for the content; nothing was done.
    Unsolicited {
        /// The item's state at arrival, if it was tracked at all.
        state: Option<FetchState>,
    },
}

/// Both halves of the direct grant channel.
pub struct CredentialExchange {
    ctx: Arc<PeerContext>,
}

impl CredentialExchange {
    pub fn new(ctx: Arc<PeerContext>) -> Self {
        Self { ctx }
    }

    /// Share bucket `bucket` and send its credentials to `claimant`.
    pub async fn grant(
        &self,
        bucket: &str,
        claimant: PeerId,
        content_id: &ContentId,
    ) -> Result<GrantPackage> {
        let share = self
            .ctx
            .storage
            .share_bucket(&BucketHandle::new(bucket))
            .await?;

        let package = GrantPackage {
            key: share.key,
            addresses: share.addresses,
            content: bucket.to_string(),
            content_id: content_id.clone(),
        };
        let payload = Bytes::from(package.to_bytes()?);

        let stream = self
            .ctx
            .transport
            .dial(&claimant, &self.ctx.config.grant_protocol)
            .await?;
        stream.write(payload).await?;
        stream.close();

        tracing::info!(%content_id, %claimant, bucket, "grant sent");
        Ok(package)
    }

    /// Accept grant streams until the transport closes the listener.
    ///
    /// Each stream is handled on its own task.
    pub async fn listen(self: Arc<Self>, mut listener: StreamListener) {
        while let Some(stream) = listener.accept().await {
            let exchange = Arc::clone(&self);
            let span = tracing::debug_span!("grant", from = %stream.remote_peer());
            tokio::spawn(
                async move {
                    if let Err(e) = exchange.handle_inbound(stream).await {
                        tracing::warn!(error = %e, "inbound grant failed");
                    }
                }
                .instrument(span),
            );
        }
        tracing::debug!(protocol = listener.protocol(), "grant listener closed");
    }

    /// Read, decode and act on one inbound grant stream.
    pub async fn handle_inbound(&self, stream: InboundStream) -> Result<FetchOutcome> {
        let body = stream.read_to_end(self.ctx.config.max_grant_bytes).await?;
        let package = GrantPackage::from_bytes(&body)?;
        self.receive_grant(package).await
    }

    /// Act on a decoded grant package.
    ///
    /// Only an item in `AwaitingGrant` is fetched. Moving it to `Fetching`
    /// claims the fetch, so of two grants racing for the same item only
    /// one proceeds. Any failure after that point marks the item `Failed`.
    pub async fn receive_grant(&self, package: GrantPackage) -> Result<FetchOutcome> {
        let content_id = package.content_id.clone();

        match self
            .ctx
            .store
            .set_fetch_state(&content_id, FetchState::Fetching)
            .await
        {
            Ok(_) => {}
            Err(StoreError::InvalidTransition { from, .. }) => {
                tracing::debug!(%content_id, state = %from, "ignoring unsolicited grant");
                return Ok(FetchOutcome::Unsolicited { state: Some(from) });
            }
            Err(StoreError::NotFound(_)) => {
                tracing::debug!(%content_id, "ignoring grant for untracked content");
                return Ok(FetchOutcome::Unsolicited { state: None });
            }
        }

        let share = BucketShare {
            key: package.key,
            addresses: package.addresses,
        };
        match self.fetch(&content_id, &package.content, &share).await {
            Ok(locator) => {
                tracing::info!(%content_id, %locator, "content ready");
                Ok(FetchOutcome::Ready(locator))
            }
            Err(e) => {
                tracing::warn!(%content_id, error = %e, "fetch failed");
                if let Err(store_err) = self
                    .ctx
                    .store
                    .set_fetch_state(&content_id, FetchState::Failed)
                    .await
                {
                    tracing::warn!(%content_id, error = %store_err, "could not mark item failed");
                }
                Err(e)
            }
        }
    }

    /// Join the shared bucket and open its first entry.
    ///
    /// Joining a bucket the storage client already knows counts as success.
    pub async fn join(&self, bucket: &str, share: &BucketShare) -> Result<Locator> {
        let storage = &self.ctx.storage;
        let handle = match storage.join_bucket(bucket, share).await {
            Ok(handle) => handle,
            Err(e) if e.is_already_joined() => {
                tracing::debug!(bucket, "bucket already joined");
                BucketHandle::new(bucket)
            }
            Err(e) => return Err(e.into()),
        };

        let entries = storage.list_entries(&handle).await?;
        let first = entries
            .first()
            .ok_or_else(|| AccessError::EmptyBucket(bucket.to_string()))?;
        if entries.len() > 1 {
            tracing::debug!(bucket, entries = entries.len(), path = %first.path, "opening first entry");
        }

        Ok(storage.open_entry(&handle, &first.path).await?)
    }

    async fn fetch(
        &self,
        content_id: &ContentId,
        bucket: &str,
        share: &BucketShare,
    ) -> Result<Locator> {
        let locator = self.join(bucket, share).await?;
        self.ctx.store.complete(content_id, locator.clone()).await?;
        Ok(locator)
    }
}
