//! Proof Issuer: signs and broadcasts access claims.

use std::sync::Arc;

use bytes::Bytes;
use pyr_access_core::{AccessClaim, ContentId, FetchState};
use pyr_access_store::StoreError;

use crate::context::PeerContext;
use crate::error::{AccessError, Result};

/// Produces block-bound claims for the local account.
pub struct ProofIssuer {
    ctx: Arc<PeerContext>,
}

impl ProofIssuer {
    pub fn new(ctx: Arc<PeerContext>) -> Self {
        Self { ctx }
    }

    /// Sign the current block and publish a claim on the content's topic.
    ///
    /// The item must already be tracked. It moves to `AwaitingGrant` before
    /// the claim goes out, so a grant racing the publish is still accepted.
    /// A publish failure marks the item `Failed`.
    pub async fn issue_claim(&self, content_id: &ContentId) -> Result<AccessClaim> {
        let block = self.ctx.ledger.current_block().await.map_err(|e| {
            tracing::warn!(%content_id, error = %e, "could not read current block");
            e
        })?;
        let signature = self
            .ctx
            .ledger
            .sign(&block.hash, &self.ctx.account)
            .await
            .map_err(|e| {
                tracing::warn!(%content_id, block = block.number, error = %e, "claim signing failed");
                e
            })?;

        let claim = AccessClaim {
            content_id: content_id.clone(),
            signature,
            block: block.number,
        };
        let payload = Bytes::from(claim.to_bytes()?);

        match self
            .ctx
            .store
            .set_fetch_state(content_id, FetchState::AwaitingGrant)
            .await
        {
            Ok(_) => {}
            Err(StoreError::InvalidTransition {
                from: FetchState::Fetching,
                ..
            }) => return Err(AccessError::FetchInProgress(content_id.clone())),
            Err(e) => return Err(e.into()),
        }

        if let Err(e) = self
            .ctx
            .transport
            .publish(content_id.topic(), payload)
            .await
        {
            tracing::warn!(%content_id, error = %e, "claim publish failed");
            if let Err(store_err) = self
                .ctx
                .store
                .set_fetch_state(content_id, FetchState::Failed)
                .await
            {
                tracing::warn!(%content_id, error = %store_err, "could not mark item failed");
            }
            return Err(e.into());
        }

        tracing::info!(%content_id, block = block.number, "access claim published");
        Ok(claim)
    }
}
