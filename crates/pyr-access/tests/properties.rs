//! Property tests for claim verification.

use std::sync::Arc;

use proptest::prelude::*;

use pyr_access::core::{AccessClaim, ContentId, Keypair, PeerId, Role};
use pyr_access::net::MemoryNetwork;
use pyr_access::oracle::{Ledger, MemoryLedger, MemoryStorageNetwork};
use pyr_access::store::{AccessStore, MemoryStore};
use pyr_access::{AccessConfig, AccessNode, ClaimOutcome, PeerContext};
use pyr_access_testkit::generators::{block_pair, content_id, keypair, peer_id};

/// Judge a claim for `id` from `signer`, relayed by `claimant`, against
/// block `signed` with the ledger at `current`. The signer holds no token.
fn judge(
    current: u64,
    signed: u64,
    signer: Keypair,
    id: ContentId,
    claimant: PeerId,
) -> (ClaimOutcome, usize) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    rt.block_on(async move {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Arc::new(MemoryLedger::new());
        let publisher = ledger.add_account(Keypair::from_seed(&[1u8; 32])).await;
        let signer = ledger.add_account(signer).await;
        ledger.register_content(id.clone(), publisher, "album", 0).await;
        ledger.advance_to(current).await;

        let hash = ledger.block_by_number(signed).await.unwrap().hash;
        let claim = AccessClaim {
            content_id: id.clone(),
            signature: ledger.sign(&hash, &signer).await.unwrap(),
            block: signed,
        };
        let store = Arc::new(MemoryStore::new());
        store.track(&id, Role::Published).await.unwrap();
        let node = AccessNode::new(PeerContext::new(
            publisher,
            AccessConfig::default(),
            ledger.clone(),
            Arc::new(MemoryStorageNetwork::new().create_client("pub", dir.path())),
            Arc::new(MemoryNetwork::new().create_transport(PeerId::random())),
            store,
        ));

        let outcome = node
            .verifier()
            .on_claim_received(&claim, claimant)
            .await
            .unwrap();
        (outcome, ledger.balance_queries())
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn fresh_claims_reach_entitlement_check(
        (current, signed) in block_pair(20),
        signer in keypair(),
        id in content_id(),
        claimant in peer_id(),
    ) {
        let (outcome, queries) = judge(current, signed, signer, id, claimant);
        let is_unauthorized = matches!(outcome, ClaimOutcome::Unauthorized { .. });
        prop_assert!(is_unauthorized);
        prop_assert_eq!(queries, 1);
    }

    #[test]
    fn old_claims_never_reach_entitlement_check(
        signed in 0u64..1_000_000,
        extra in 21u64..1_000,
        signer in keypair(),
        id in content_id(),
        claimant in peer_id(),
    ) {
        let (outcome, queries) = judge(signed + extra, signed, signer, id, claimant);
        let is_stale = matches!(outcome, ClaimOutcome::Stale { .. });
        prop_assert!(is_stale);
        prop_assert_eq!(queries, 0);
    }
}
