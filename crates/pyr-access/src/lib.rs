//! # Pyr Access
//!
//! Ledger-verified release of content storage credentials between peers.
//!
//! ## Overview
//!
//! A peer that holds an entitlement token for a content item proves it to
//! whoever can share that content, and receives the credentials needed to
//! fetch it from decentralized storage:
//!
//! - **Proof Issuer**: signs a recent block hash and publishes a claim on
//!   the content's discovery topic
//! - **Subscription Manager**: keeps the local peer listening on the topic
//!   of every item it tracks
//! - **Verifier**: checks each claim's freshness, recovers the signer and
//!   queries the signer's token balance
//! - **Credential Exchange**: sends the bucket share to an authorized
//!   claimant over a direct stream, and joins buckets it is granted
//!
//! ## Key Concepts
//!
//! - **Claim**: content id, signature and block number. Stale after
//!   [`AccessConfig::freshness_window`] blocks.
//! - **Grant package**: bucket key and addresses, sent only after a
//!   positive balance check.
//! - **Fetch state**: `not-requested -> awaiting-grant -> fetching -> ready`,
//!   or `failed`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use pyr_access::{AccessConfig, AccessNode, PeerContext};
//! use pyr_access::core::{ContentId, Keypair, PeerId};
//! use pyr_access::net::MemoryNetwork;
//! use pyr_access::oracle::{MemoryLedger, MemoryStorageNetwork};
//! use pyr_access::store::MemoryStore;
//!
//! async fn example() {
//!     let ledger = Arc::new(MemoryLedger::new());
//!     let account = ledger.add_account(Keypair::generate()).await;
//!     let storage = MemoryStorageNetwork::new().create_client("me", "/tmp/pyr");
//!     let transport = MemoryNetwork::new().create_transport(PeerId::random());
//!
//!     let node = AccessNode::new(PeerContext::new(
//!         account,
//!         AccessConfig::default(),
//!         ledger,
//!         Arc::new(storage),
//!         Arc::new(transport),
//!         Arc::new(MemoryStore::new()),
//!     ));
//!     node.start().await.unwrap();
//!
//!     // Broadcast a claim; a holder of the content answers with a grant
//!     node.request_access(&ContentId::new("0xABC")).await.unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `pyr_access::core` - Identifiers, signatures and wire messages
//! - `pyr_access::store` - Access State Store
//! - `pyr_access::oracle` - Ledger and storage interfaces
//! - `pyr_access::net` - Discovery and direct-channel transport

pub mod config;
pub mod context;
pub mod error;
pub mod exchange;
pub mod issuer;
pub mod library;
pub mod node;
pub mod publish;
pub mod subscription;
pub mod verify;

// Re-export component crates
pub use pyr_access_core as core;
pub use pyr_access_net as net;
pub use pyr_access_oracle as oracle;
pub use pyr_access_store as store;

pub use config::AccessConfig;
pub use context::PeerContext;
pub use error::{AccessError, Result};
pub use exchange::{CredentialExchange, FetchOutcome};
pub use issuer::ProofIssuer;
pub use library::{Library, LibraryReport};
pub use node::AccessNode;
pub use publish::{ContentUpload, Publisher};
pub use subscription::SubscriptionManager;
pub use verify::{ClaimOutcome, Verifier};

pub use pyr_access_core::{
    AccessClaim, Address, ContentId, ContentItem, FetchState, GrantPackage, Locator, PeerId, Role,
};
