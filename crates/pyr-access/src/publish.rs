//! Publishing new content and buying existing content.

use std::sync::Arc;

use pyr_access_core::{ContentId, Role};
use pyr_access_oracle::{FileSource, NewContent, PutEvent};

use crate::context::PeerContext;
use crate::error::{AccessError, Result};

/// Length of the tail of the first bucket address stored on the ledger.
const STORAGE_SEED_LEN: usize = 116;

/// Files and ledger terms for a new content item.
#[derive(Debug, Clone)]
pub struct ContentUpload {
    /// Content title. Also names the storage bucket.
    pub title: String,
    /// Token price, in the ledger's smallest unit.
    pub price: u128,
    pub files: Vec<FileSource>,
}

/// Turns uploads into ledger content and purchases into entitlements.
pub struct Publisher {
    ctx: Arc<PeerContext>,
}

impl Publisher {
    pub fn new(ctx: Arc<PeerContext>) -> Self {
        Self { ctx }
    }

    /// Upload files into a new bucket and register the content on the ledger.
    ///
    /// The new item is tracked as published.
    pub async fn publish(&self, upload: ContentUpload) -> Result<ContentId> {
        let storage = &self.ctx.storage;
        let bucket = storage.create_bucket(&upload.title).await?;

        let mut events = storage.put_files(&bucket, "/", upload.files).await?;
        let mut uploaded = 0u64;
        loop {
            match events.recv().await {
                Some(PutEvent::Progress { path, bytes }) => {
                    uploaded += bytes;
                    tracing::trace!(bucket = %bucket.name, path = %path, bytes, "file stored");
                }
                Some(PutEvent::Error(message)) => return Err(AccessError::UploadFailed(message)),
                Some(PutEvent::Done) => break,
                None => {
                    return Err(AccessError::UploadFailed(
                        "upload ended before completion".into(),
                    ))
                }
            }
        }

        let share = storage.share_bucket(&bucket).await?;
        let storage_seed = share
            .addresses
            .first()
            .map(|address| storage_seed(address))
            .unwrap_or_default();

        let content_id = self
            .ctx
            .ledger
            .publish_content(
                &self.ctx.account,
                NewContent {
                    title: upload.title,
                    price: upload.price,
                    storage_seed,
                },
            )
            .await?;
        self.ctx.store.track(&content_id, Role::Published).await?;

        tracing::info!(%content_id, bucket = %bucket.name, bytes = uploaded, "content published");
        Ok(content_id)
    }

    /// Pay the listed price for one token of `content_id`.
    ///
    /// The item is tracked as collected once the purchase lands.
    pub async fn purchase(&self, content_id: &ContentId) -> Result<()> {
        let contract = self.ctx.contracts.ensure(content_id).await;
        let price = contract.metadata().await?.price;

        self.ctx
            .ledger
            .purchase(&self.ctx.account, content_id, price)
            .await?;
        self.ctx.store.track(content_id, Role::Collected).await?;

        tracing::info!(%content_id, price = %price, "content purchased");
        Ok(())
    }
}

fn storage_seed(address: &str) -> String {
    let start = address.len().saturating_sub(STORAGE_SEED_LEN);
    address.get(start..).unwrap_or(address).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_seed_keeps_address_tail() {
        assert_eq!(storage_seed("/memory/pub/abc"), "/memory/pub/abc");

        let long = format!("/ip4/127.0.0.1/tcp/4001/p2p/{}", "Q".repeat(200));
        let seed = storage_seed(&long);
        assert_eq!(seed.len(), STORAGE_SEED_LEN);
        assert!(long.ends_with(&seed));
    }
}
