//! In-memory ledger.
//!
//! Blocks only advance when told to, which keeps freshness arithmetic in
//! tests exact. Transactions are applied at the current head.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use pyr_access_core::{Address, Block, BlockHash, ClaimSignature, ContentId, Keypair};

use crate::error::LedgerError;
use crate::ledger::{ContentMetadata, Ledger, NewContent, PublishEvent, Result};

/// Deterministic hash of block `number`.
pub fn block_hash(number: u64) -> BlockHash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"pyr-block-v0:");
    hasher.update(&number.to_le_bytes());
    BlockHash(*hasher.finalize().as_bytes())
}

/// In-memory ledger implementation.
///
/// Also counts entitlement and metadata queries so tests can assert which
/// ledger calls a flow made.
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
    available: AtomicBool,
    balance_queries: AtomicUsize,
    metadata_queries: AtomicUsize,
}

#[derive(Default)]
struct LedgerState {
    head: u64,
    accounts: HashMap<Address, Keypair>,
    contents: HashMap<ContentId, ContentMetadata>,
    balances: HashMap<(ContentId, Address), u64>,
    events: Vec<PublishEvent>,
    nonce: u64,
}

impl MemoryLedger {
    /// Create a ledger at block 0 with no accounts or content.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            available: AtomicBool::new(true),
            balance_queries: AtomicUsize::new(0),
            metadata_queries: AtomicUsize::new(0),
        }
    }

    /// Add an account whose key the ledger client holds.
    pub async fn add_account(&self, keypair: Keypair) -> Address {
        let address = keypair.address();
        self.state.write().await.accounts.insert(address, keypair);
        address
    }

    /// Add an account derived from a 32-byte seed.
    pub async fn create_account(&self, seed: &[u8; 32]) -> Address {
        self.add_account(Keypair::from_seed(seed)).await
    }

    /// Current head block number.
    pub async fn head(&self) -> u64 {
        self.state.read().await.head
    }

    /// Move the head to `number`. The head never moves backwards.
    pub async fn advance_to(&self, number: u64) {
        let mut state = self.state.write().await;
        state.head = state.head.max(number);
    }

    /// Advance the head by `blocks`.
    pub async fn mine(&self, blocks: u64) {
        let mut state = self.state.write().await;
        state.head = state.head.saturating_add(blocks);
    }

    /// Deploy a content contract at a chosen id, emitting a publish event.
    pub async fn register_content(
        &self,
        id: ContentId,
        publisher: Address,
        title: impl Into<String>,
        price: u128,
    ) {
        let mut state = self.state.write().await;
        let metadata = ContentMetadata {
            title: title.into(),
            price,
            storage_seed: String::new(),
            publisher,
        };
        Self::deploy(&mut state, id, metadata);
    }

    /// Credit `amount` tokens of `content` to `account`.
    pub async fn mint(&self, content: &ContentId, account: &Address, amount: u64) {
        let mut state = self.state.write().await;
        *state
            .balances
            .entry((content.clone(), *account))
            .or_default() += amount;
    }

    /// Make every ledger call fail with `Unavailable` (or recover).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of `token_balance` calls served so far.
    pub fn balance_queries(&self) -> usize {
        self.balance_queries.load(Ordering::SeqCst)
    }

    /// Number of `content_metadata` calls served so far.
    pub fn metadata_queries(&self) -> usize {
        self.metadata_queries.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(LedgerError::Unavailable("ledger offline".into()))
        }
    }

    fn deploy(state: &mut LedgerState, id: ContentId, metadata: ContentMetadata) {
        state.events.push(PublishEvent {
            block: state.head,
            content_id: id.clone(),
            publisher: metadata.publisher,
        });
        state.contents.insert(id, metadata);
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn current_block(&self) -> Result<Block> {
        self.check_available()?;
        let head = self.state.read().await.head;
        Ok(Block {
            number: head,
            hash: block_hash(head),
        })
    }

    async fn block_by_number(&self, number: u64) -> Result<Block> {
        self.check_available()?;
        if number > self.state.read().await.head {
            return Err(LedgerError::BlockNotFound(number));
        }
        Ok(Block {
            number,
            hash: block_hash(number),
        })
    }

    async fn sign(&self, hash: &BlockHash, account: &Address) -> Result<ClaimSignature> {
        self.check_available()?;
        let state = self.state.read().await;
        let keypair = state
            .accounts
            .get(account)
            .ok_or(LedgerError::UnknownAccount(*account))?;
        Ok(keypair.sign_hash(hash))
    }

    async fn recover_signer(
        &self,
        hash: &BlockHash,
        signature: &ClaimSignature,
    ) -> Result<Address> {
        self.check_available()?;
        Ok(signature.recover(hash)?)
    }

    async fn token_balance(&self, account: &Address, content: &ContentId) -> Result<u64> {
        self.check_available()?;
        self.balance_queries.fetch_add(1, Ordering::SeqCst);
        let state = self.state.read().await;
        if !state.contents.contains_key(content) {
            return Err(LedgerError::UnknownContent(content.clone()));
        }
        Ok(state
            .balances
            .get(&(content.clone(), *account))
            .copied()
            .unwrap_or(0))
    }

    async fn content_metadata(&self, content: &ContentId) -> Result<ContentMetadata> {
        self.check_available()?;
        self.metadata_queries.fetch_add(1, Ordering::SeqCst);
        self.state
            .read()
            .await
            .contents
            .get(content)
            .cloned()
            .ok_or_else(|| LedgerError::UnknownContent(content.clone()))
    }

    async fn past_publish_events(
        &self,
        from_block: u64,
        to_block: Option<u64>,
    ) -> Result<Vec<PublishEvent>> {
        self.check_available()?;
        let state = self.state.read().await;
        let to_block = to_block.unwrap_or(state.head);
        Ok(state
            .events
            .iter()
            .filter(|e| e.block >= from_block && e.block <= to_block)
            .cloned()
            .collect())
    }

    async fn creator_library(&self, creator: &Address) -> Result<Vec<ContentId>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .events
            .iter()
            .filter(|e| &e.publisher == creator)
            .map(|e| e.content_id.clone())
            .collect())
    }

    async fn publish_content(
        &self,
        publisher: &Address,
        content: NewContent,
    ) -> Result<ContentId> {
        self.check_available()?;
        let mut state = self.state.write().await;
        if !state.accounts.contains_key(publisher) {
            return Err(LedgerError::UnknownAccount(*publisher));
        }

        state.nonce += 1;
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"pyr-content-v0:");
        hasher.update(publisher.as_bytes());
        hasher.update(&state.nonce.to_le_bytes());
        let digest = hasher.finalize();
        let id = ContentId::new(format!("0x{}", hex::encode(&digest.as_bytes()[..20])));

        let metadata = ContentMetadata {
            title: content.title,
            price: content.price,
            storage_seed: content.storage_seed,
            publisher: *publisher,
        };
        Self::deploy(&mut state, id.clone(), metadata);
        tracing::debug!(content_id = %id, %publisher, "content published");
        Ok(id)
    }

    async fn purchase(&self, buyer: &Address, content: &ContentId, value: u128) -> Result<()> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let price = state
            .contents
            .get(content)
            .map(|m| m.price)
            .ok_or_else(|| LedgerError::UnknownContent(content.clone()))?;

        if value < price {
            return Err(LedgerError::InsufficientPayment {
                required: price,
                offered: value,
            });
        }

        *state
            .balances
            .entry((content.clone(), *buyer))
            .or_default() += 1;
        Ok(())
    }
}
