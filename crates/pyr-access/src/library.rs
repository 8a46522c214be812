//! Rebuilding the tracked library from the ledger.

use std::sync::Arc;

use pyr_access_core::{ContentId, Role};

use crate::context::PeerContext;
use crate::error::Result;

/// Items found by a library refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryReport {
    /// Content the local account published.
    pub published: Vec<ContentId>,
    /// Content the local account holds a token for.
    pub collected: Vec<ContentId>,
    /// Content whose balance could not be read.
    pub skipped: Vec<ContentId>,
}

/// Discovers which content the local account owns a role in.
pub struct Library {
    ctx: Arc<PeerContext>,
}

impl Library {
    pub fn new(ctx: Arc<PeerContext>) -> Self {
        Self { ctx }
    }

    /// Track every item the local account published or holds a token for.
    ///
    /// Collected items are found by scanning publish events from the
    /// configured bootstrap block and checking the account's balance. A
    /// failed balance query skips that item only.
    pub async fn refresh(&self) -> Result<LibraryReport> {
        let ctx = &self.ctx;
        let mut report = LibraryReport::default();

        for content_id in ctx.ledger.creator_library(&ctx.account).await? {
            ctx.store.track(&content_id, Role::Published).await?;
            report.published.push(content_id);
        }

        let events = ctx
            .ledger
            .past_publish_events(ctx.config.bootstrap_from_block, None)
            .await?;
        for event in events {
            let contract = ctx.contracts.ensure(&event.content_id).await;
            match contract.balance_of(&ctx.account).await {
                Ok(0) => {}
                Ok(_) => {
                    ctx.store.track(&event.content_id, Role::Collected).await?;
                    report.collected.push(event.content_id);
                }
                Err(e) => {
                    tracing::warn!(content_id = %event.content_id, error = %e, "skipping content with unreadable balance");
                    report.skipped.push(event.content_id);
                }
            }
        }

        tracing::info!(
            published = report.published.len(),
            collected = report.collected.len(),
            skipped = report.skipped.len(),
            "library refreshed"
        );
        Ok(report)
    }
}
