//! # Pyr Access Core
//!
//! Pure primitives for the Pyr access-grant protocol: identifiers, ledger
//! blocks, claim signatures, tracked content items and the wire messages
//! exchanged between peers.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`ContentId`] - Ledger address of a content item (also its discovery topic)
//! - [`Address`] - A ledger account, recovered from claim signatures
//! - [`PeerId`] - Transport-level identity of a peer
//! - [`AccessClaim`] - Block-bound ownership claim broadcast on the discovery channel
//! - [`GrantPackage`] - Storage credentials sent to a verified claimant
//! - [`ContentItem`] / [`FetchState`] - Per-item tracking record and its state machine
//!
//! ## Wire Format
//!
//! Both messages are JSON objects. See [`messages`].

pub mod content;
pub mod crypto;
pub mod error;
pub mod messages;
pub mod types;

pub use content::{ContentItem, FetchState, Locator, Role, Roles};
pub use crypto::{ClaimSignature, Keypair, PublicKey};
pub use error::{CoreError, Result};
pub use messages::{
    is_fresh, AccessClaim, GrantPackage, DEFAULT_FRESHNESS_WINDOW, GRANT_PROTOCOL,
};
pub use types::{Address, Block, BlockHash, ContentId, PeerId};
