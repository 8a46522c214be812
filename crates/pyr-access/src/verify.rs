//! Verification & Authorization Engine.
//!
//! Decides, for each claim heard on a subscribed topic, whether the sender
//! holds an entitlement token and should be sent credentials. Every claim
//! is judged on its own; denials are silent.

use std::sync::Arc;

use pyr_access_core::{is_fresh, AccessClaim, Address, PeerId};
use pyr_access_net::PubSubMessage;
use pyr_access_oracle::LedgerError;

use crate::context::PeerContext;
use crate::error::Result;
use crate::exchange::CredentialExchange;

/// What the engine did with one claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The claim came from the local peer.
    SelfClaim,
    /// The payload did not decode, or named a content other than its topic.
    Malformed,
    /// The signed block is older than the freshness window, or in the future.
    Stale { signed_block: u64, current_block: u64 },
    /// The signature does not recover to an account.
    BadSignature,
    /// The signer holds no token.
    Unauthorized { signer: Address },
    /// Credentials were sent to the claimant.
    Granted { signer: Address, balance: u64 },
}

/// Judges inbound claims and triggers grants.
pub struct Verifier {
    ctx: Arc<PeerContext>,
    exchange: Arc<CredentialExchange>,
}

impl Verifier {
    pub fn new(ctx: Arc<PeerContext>, exchange: Arc<CredentialExchange>) -> Self {
        Self { ctx, exchange }
    }

    /// Decode a topic message and judge the claim it carries.
    pub async fn on_message(&self, message: &PubSubMessage) -> Result<ClaimOutcome> {
        let claim = match AccessClaim::from_bytes(&message.data) {
            Ok(claim) => claim,
            Err(e) => {
                tracing::debug!(topic = %message.topic, from = %message.from, error = %e, "dropping undecodable claim");
                return Ok(ClaimOutcome::Malformed);
            }
        };
        if claim.content_id.topic() != message.topic {
            tracing::debug!(topic = %message.topic, content_id = %claim.content_id, "dropping claim published on a foreign topic");
            return Ok(ClaimOutcome::Malformed);
        }

        self.on_claim_received(&claim, message.from).await
    }

    /// Judge one claim from `claimant` and grant access if it holds.
    ///
    /// Checks run cheapest first: self-origin, then freshness, then
    /// signature recovery, then the entitlement query. Only a positive
    /// balance leads to a grant.
    pub async fn on_claim_received(
        &self,
        claim: &AccessClaim,
        claimant: PeerId,
    ) -> Result<ClaimOutcome> {
        let content_id = &claim.content_id;

        if claimant == self.ctx.peer_id() {
            tracing::trace!(%content_id, "ignoring own claim");
            return Ok(ClaimOutcome::SelfClaim);
        }

        let current = self.ctx.ledger.current_block().await?;
        if !is_fresh(current.number, claim.block, self.ctx.config.freshness_window) {
            tracing::debug!(
                %content_id,
                %claimant,
                signed_block = claim.block,
                current_block = current.number,
                "dropping stale claim"
            );
            return Ok(ClaimOutcome::Stale {
                signed_block: claim.block,
                current_block: current.number,
            });
        }

        let signed = self.ctx.ledger.block_by_number(claim.block).await?;
        let signer = match self
            .ctx
            .ledger
            .recover_signer(&signed.hash, &claim.signature)
            .await
        {
            Ok(signer) => signer,
            Err(LedgerError::Signature(e)) => {
                tracing::debug!(%content_id, %claimant, error = %e, "dropping claim with bad signature");
                return Ok(ClaimOutcome::BadSignature);
            }
            Err(e) => return Err(e.into()),
        };

        let contract = self.ctx.contracts.ensure(content_id).await;
        let balance = contract.balance_of(&signer).await?;
        if balance == 0 {
            tracing::debug!(%content_id, %claimant, %signer, "claimant holds no token");
            return Ok(ClaimOutcome::Unauthorized { signer });
        }

        let metadata = contract.metadata().await?;
        self.exchange
            .grant(&metadata.title, claimant, content_id)
            .await?;

        Ok(ClaimOutcome::Granted { signer, balance })
    }
}
