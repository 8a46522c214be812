//! Error types for the store module.

use pyr_access_core::{ContentId, FetchState};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The content item is not tracked.
    #[error("content not tracked: {0}")]
    NotFound(ContentId),

    /// The requested fetch-state change is not a legal transition.
    #[error("invalid transition for {id}: {from} -> {to}")]
    InvalidTransition {
        id: ContentId,
        from: FetchState,
        to: FetchState,
    },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
