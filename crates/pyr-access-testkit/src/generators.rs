//! Proptest generators for property-based testing.

use proptest::prelude::*;

use pyr_access_core::{ContentId, Keypair, PeerId};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a ledger-style content id (`0x` followed by 40 hex digits).
pub fn content_id() -> impl Strategy<Value = ContentId> {
    "0x[0-9a-f]{40}".prop_map(ContentId::new)
}

/// Generate a random transport identity.
pub fn peer_id() -> impl Strategy<Value = PeerId> {
    any::<[u8; 32]>().prop_map(PeerId::from_bytes)
}

/// Generate a (current, signed) block pair where the signed block is at
/// most `max_age` blocks old.
pub fn block_pair(max_age: u64) -> impl Strategy<Value = (u64, u64)> {
    (max_age..u64::MAX / 2, 0..=max_age).prop_map(|(current, age)| (current, current - age))
}
