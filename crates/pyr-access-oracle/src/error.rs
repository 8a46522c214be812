//! Error types for the ledger and storage oracles.

use pyr_access_core::{Address, ContentId, CoreError};
use thiserror::Error;

/// Errors returned by a [`crate::Ledger`].
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No block with this number exists (yet).
    #[error("block {0} not found")]
    BlockNotFound(u64),

    /// The ledger client holds no key for this account.
    #[error("unknown account: {0}")]
    UnknownAccount(Address),

    /// No content contract is deployed at this id.
    #[error("unknown content: {0}")]
    UnknownContent(ContentId),

    /// A purchase sent less than the content's price.
    #[error("insufficient payment: required {required}, offered {offered}")]
    InsufficientPayment { required: u128, offered: u128 },

    /// Signature could not be recovered.
    #[error("signature error: {0}")]
    Signature(#[from] CoreError),

    /// The ledger client could not be reached.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by a [`crate::Storage`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// A bucket with this name already exists locally.
    #[error("bucket already exists: {0}")]
    BucketExists(String),

    /// No local bucket with this name.
    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    /// The bucket was joined before. Callers treat this as success.
    #[error("bucket already joined: {0}")]
    AlreadyJoined(String),

    /// The share key does not resolve to any bucket.
    #[error("no shared bucket for key")]
    UnknownShare,

    /// The bucket holds no entry at this path.
    #[error("entry {path} not found in bucket {bucket}")]
    EntryNotFound { bucket: String, path: String },

    /// Local filesystem error while materialising an entry.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The storage service could not be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Whether this is the join-idempotency case.
    pub fn is_already_joined(&self) -> bool {
        matches!(self, StorageError::AlreadyJoined(_))
    }
}
