//! AccessStore trait: the abstract interface of the Access State Store.

use async_trait::async_trait;
use pyr_access_core::{ContentId, ContentItem, FetchState, Locator, Role};

use crate::error::Result;

/// Result of tracking a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackResult {
    /// The item was not tracked before and has been inserted.
    Inserted,
    /// The item was already tracked; `role_added` tells whether the role was new.
    AlreadyTracked { role_added: bool },
}

impl TrackResult {
    /// Whether this call created the record.
    pub fn is_new(&self) -> bool {
        matches!(self, TrackResult::Inserted)
    }
}

/// The AccessStore trait: async interface for tracked content.
///
/// # Design Notes
///
/// - `track` deduplicates by id; the existence check and the insert are one
///   atomic step with respect to every other mutator.
/// - `set_fetch_state` and `complete` on the same id are mutually exclusive.
/// - An item has a locator only while it is `Ready`.
/// - Readers get snapshots and never observe a half-applied update.
#[async_trait]
pub trait AccessStore: Send + Sync {
    /// Track a content item under `role`, adding the role if already tracked.
    async fn track(&self, id: &ContentId, role: Role) -> Result<TrackResult>;

    /// Get a snapshot of one item.
    async fn get(&self, id: &ContentId) -> Result<Option<ContentItem>>;

    /// Snapshot of all tracked items, optionally filtered by role, ordered by id.
    async fn list(&self, role: Option<Role>) -> Result<Vec<ContentItem>>;

    /// Move an item's fetch state, validating the transition.
    ///
    /// Returns the previous state. Fails with `InvalidTransition` if the
    /// move is not allowed from the item's current state.
    async fn set_fetch_state(&self, id: &ContentId, state: FetchState) -> Result<FetchState>;

    /// Move a `Fetching` item to `Ready` and record where its file landed.
    ///
    /// Both changes apply in one step. Returns the previous state.
    async fn complete(&self, id: &ContentId, locator: Locator) -> Result<FetchState>;
}
