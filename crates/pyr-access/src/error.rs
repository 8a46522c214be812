//! Error types for the access protocol.

use pyr_access_core::{ContentId, CoreError};
use pyr_access_net::TransportError;
use pyr_access_oracle::{LedgerError, StorageError};
use pyr_access_store::StoreError;
use thiserror::Error;

/// Errors that can occur in an access-protocol flow.
///
/// None of these are fatal to the node; each is confined to the flow of a
/// single content id.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Malformed identifier, signature or wire message.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Access State Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Ledger oracle error.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Storage oracle error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Discovery or direct channel error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A fetch for this content is in flight; a new claim would race it.
    #[error("fetch already in progress: {0}")]
    FetchInProgress(ContentId),

    /// A granted bucket holds no entries.
    #[error("bucket {0} is empty")]
    EmptyBucket(String),

    /// Uploading content files failed.
    #[error("upload failed: {0}")]
    UploadFailed(String),
}

/// Result type for access-protocol operations.
pub type Result<T> = std::result::Result<T, AccessError>;
