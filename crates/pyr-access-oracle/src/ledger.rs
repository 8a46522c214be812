//! Ledger oracle: the smart-contract client the protocol consults.
//!
//! Reads (blocks, balances, metadata, events) back the verification engine;
//! signing backs the proof issuer; writes (publish, purchase) back the
//! publishing and purchasing flows.

use async_trait::async_trait;

use pyr_access_core::{Address, Block, BlockHash, ClaimSignature, ContentId};

use crate::error::LedgerError;

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Metadata a publisher registered for a content item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentMetadata {
    /// Content title; also the name of the storage bucket holding it.
    pub title: String,
    /// Price of one entitlement token, in the ledger's smallest unit.
    pub price: u128,
    /// Storage seed (bucket thread info) registered at publish time.
    pub storage_seed: String,
    /// Account that published the content.
    pub publisher: Address,
}

/// Parameters of a new content registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContent {
    pub title: String,
    pub price: u128,
    pub storage_seed: String,
}

/// A `ContentPublished` event from the ledger log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishEvent {
    /// Block the event was emitted in.
    pub block: u64,
    /// Address of the new content contract.
    pub content_id: ContentId,
    /// Account that published it.
    pub publisher: Address,
}

/// The Ledger trait: async interface to the shared ledger.
///
/// Implementations must be safe for concurrent use; every call is a
/// suspension point with unbounded latency.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Header of the latest block.
    async fn current_block(&self) -> Result<Block>;

    /// Header of a historical block.
    async fn block_by_number(&self, number: u64) -> Result<Block>;

    /// Sign a block hash with the key of `account`.
    async fn sign(&self, hash: &BlockHash, account: &Address) -> Result<ClaimSignature>;

    /// Recover the account that produced `signature` over `hash`.
    async fn recover_signer(&self, hash: &BlockHash, signature: &ClaimSignature)
        -> Result<Address>;

    /// Number of entitlement tokens `account` holds for `content`.
    async fn token_balance(&self, account: &Address, content: &ContentId) -> Result<u64>;

    /// Metadata registered for `content`.
    async fn content_metadata(&self, content: &ContentId) -> Result<ContentMetadata>;

    /// Publish events emitted in `from_block..=to_block` (`None` = latest).
    async fn past_publish_events(
        &self,
        from_block: u64,
        to_block: Option<u64>,
    ) -> Result<Vec<PublishEvent>>;

    /// Content ids published by `creator`.
    async fn creator_library(&self, creator: &Address) -> Result<Vec<ContentId>>;

    /// Register new content; returns the new content contract address.
    async fn publish_content(&self, publisher: &Address, content: NewContent)
        -> Result<ContentId>;

    /// Buy one entitlement token for `content`, paying `value`.
    async fn purchase(&self, buyer: &Address, content: &ContentId, value: u128) -> Result<()>;
}
