//! In-memory implementation of the AccessStore trait.
//!
//! The id index sits behind one lock that is only held long enough to look
//! up or insert an entry. Each item has its own mutex, so transitions on
//! different items never wait on each other.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use pyr_access_core::{ContentId, ContentItem, FetchState, Locator, Role};

use crate::error::{Result, StoreError};
use crate::traits::{AccessStore, TrackResult};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped.
#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<ContentId, Arc<Mutex<ContentItem>>>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked items.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Whether nothing is tracked yet.
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    async fn entry(&self, id: &ContentId) -> Result<Arc<Mutex<ContentItem>>> {
        self.items
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}

#[async_trait]
impl AccessStore for MemoryStore {
    async fn track(&self, id: &ContentId, role: Role) -> Result<TrackResult> {
        let existing = {
            let mut items = self.items.write().await;
            match items.get(id) {
                Some(entry) => Arc::clone(entry),
                None => {
                    items.insert(
                        id.clone(),
                        Arc::new(Mutex::new(ContentItem::new(id.clone(), role))),
                    );
                    tracing::debug!(content_id = %id, ?role, "tracking content");
                    return Ok(TrackResult::Inserted);
                }
            }
        };

        let role_added = existing.lock().await.roles.insert(role);
        Ok(TrackResult::AlreadyTracked { role_added })
    }

    async fn get(&self, id: &ContentId) -> Result<Option<ContentItem>> {
        let entry = self.items.read().await.get(id).cloned();
        match entry {
            Some(entry) => Ok(Some(entry.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn list(&self, role: Option<Role>) -> Result<Vec<ContentItem>> {
        let entries: Vec<_> = self.items.read().await.values().cloned().collect();

        let mut snapshot = Vec::with_capacity(entries.len());
        for entry in entries {
            let item = entry.lock().await.clone();
            if role.map_or(true, |r| item.roles.contains(r)) {
                snapshot.push(item);
            }
        }
        snapshot.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(snapshot)
    }

    async fn set_fetch_state(&self, id: &ContentId, state: FetchState) -> Result<FetchState> {
        let entry = self.entry(id).await?;
        let mut item = entry.lock().await;

        let previous = item.fetch_state;
        if !previous.can_transition_to(state) {
            return Err(StoreError::InvalidTransition {
                id: id.clone(),
                from: previous,
                to: state,
            });
        }

        item.fetch_state = state;
        if state == FetchState::AwaitingGrant {
            item.locator = None;
        }
        tracing::trace!(content_id = %id, from = %previous, to = %state, "fetch state");
        Ok(previous)
    }

    async fn complete(&self, id: &ContentId, locator: Locator) -> Result<FetchState> {
        let entry = self.entry(id).await?;
        let mut item = entry.lock().await;

        let previous = item.fetch_state;
        if previous != FetchState::Fetching {
            return Err(StoreError::InvalidTransition {
                id: id.clone(),
                from: previous,
                to: FetchState::Ready,
            });
        }

        item.fetch_state = FetchState::Ready;
        item.locator = Some(locator);
        tracing::trace!(content_id = %id, from = %previous, to = %FetchState::Ready, "fetch state");
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ContentId {
        ContentId::new(s)
    }

    #[tokio::test]
    async fn test_track_is_idempotent() {
        let store = MemoryStore::new();

        let r1 = store.track(&id("0xA"), Role::Collected).await.unwrap();
        let r2 = store.track(&id("0xA"), Role::Collected).await.unwrap();

        assert_eq!(r1, TrackResult::Inserted);
        assert_eq!(r2, TrackResult::AlreadyTracked { role_added: false });
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_roles_accumulate() {
        let store = MemoryStore::new();

        store.track(&id("0xA"), Role::Published).await.unwrap();
        let r = store.track(&id("0xA"), Role::Collected).await.unwrap();
        assert_eq!(r, TrackResult::AlreadyTracked { role_added: true });

        let item = store.get(&id("0xA")).await.unwrap().unwrap();
        assert!(item.roles.published);
        assert!(item.roles.collected);
    }

    #[tokio::test]
    async fn test_concurrent_track_single_record() {
        let store = Arc::new(MemoryStore::new());

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            let role = if i % 2 == 0 { Role::Published } else { Role::Collected };
            handles.push(tokio::spawn(async move {
                store.track(&ContentId::new("0xRACE"), role).await.unwrap()
            }));
        }

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap().is_new() {
                inserted += 1;
            }
        }

        assert_eq!(inserted, 1);
        assert_eq!(store.len().await, 1);
        let item = store.get(&id("0xRACE")).await.unwrap().unwrap();
        assert!(item.roles.published && item.roles.collected);
    }

    #[tokio::test]
    async fn test_list_filters_by_role() {
        let store = MemoryStore::new();
        store.track(&id("0xB"), Role::Collected).await.unwrap();
        store.track(&id("0xA"), Role::Published).await.unwrap();

        let all = store.list(None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, id("0xA"));

        let published = store.list(Some(Role::Published)).await.unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].id, id("0xA"));
    }

    #[tokio::test]
    async fn test_fetch_state_transitions_validated() {
        let store = MemoryStore::new();
        store.track(&id("0xA"), Role::Collected).await.unwrap();

        let err = store
            .set_fetch_state(&id("0xA"), FetchState::Fetching)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));

        let prev = store
            .set_fetch_state(&id("0xA"), FetchState::AwaitingGrant)
            .await
            .unwrap();
        assert_eq!(prev, FetchState::NotRequested);

        store.set_fetch_state(&id("0xA"), FetchState::Fetching).await.unwrap();
        store.complete(&id("0xA"), Locator::new("/tmp/file")).await.unwrap();

        let item = store.get(&id("0xA")).await.unwrap().unwrap();
        assert_eq!(item.fetch_state, FetchState::Ready);
        assert_eq!(item.locator, Some(Locator::new("/tmp/file")));
    }

    #[tokio::test]
    async fn test_reclaim_clears_locator() {
        let store = MemoryStore::new();
        store.track(&id("0xA"), Role::Collected).await.unwrap();
        store.set_fetch_state(&id("0xA"), FetchState::AwaitingGrant).await.unwrap();
        store.set_fetch_state(&id("0xA"), FetchState::Fetching).await.unwrap();
        store.complete(&id("0xA"), Locator::new("/old")).await.unwrap();

        store.set_fetch_state(&id("0xA"), FetchState::AwaitingGrant).await.unwrap();
        let item = store.get(&id("0xA")).await.unwrap().unwrap();
        assert_eq!(item.locator, None);
    }

    #[tokio::test]
    async fn test_complete_requires_fetching() {
        let store = MemoryStore::new();
        store.track(&id("0xA"), Role::Collected).await.unwrap();
        store.set_fetch_state(&id("0xA"), FetchState::AwaitingGrant).await.unwrap();

        let err = store
            .complete(&id("0xA"), Locator::new("/early"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidTransition { from: FetchState::AwaitingGrant, to: FetchState::Ready, .. }
        ));
        let item = store.get(&id("0xA")).await.unwrap().unwrap();
        assert_eq!(item.fetch_state, FetchState::AwaitingGrant);
        assert_eq!(item.locator, None);

        store.set_fetch_state(&id("0xA"), FetchState::Fetching).await.unwrap();
        let item = store.get(&id("0xA")).await.unwrap().unwrap();
        assert_eq!(item.locator, None);

        let prev = store.complete(&id("0xA"), Locator::new("/file")).await.unwrap();
        assert_eq!(prev, FetchState::Fetching);
        let item = store.get(&id("0xA")).await.unwrap().unwrap();
        assert_eq!(item.fetch_state, FetchState::Ready);
        assert!(item.fetch_state.is_final());
        assert_eq!(item.locator, Some(Locator::new("/file")));

        assert!(store.complete(&id("0xA"), Locator::new("/again")).await.is_err());
    }

    #[tokio::test]
    async fn test_untracked_item_errors() {
        let store = MemoryStore::new();
        let err = store
            .set_fetch_state(&id("0xNONE"), FetchState::AwaitingGrant)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_only_one_racer_wins_a_transition() {
        let store = Arc::new(MemoryStore::new());
        store.track(&id("0xA"), Role::Collected).await.unwrap();
        store.set_fetch_state(&id("0xA"), FetchState::AwaitingGrant).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .set_fetch_state(&ContentId::new("0xA"), FetchState::Fetching)
                    .await
                    .is_ok()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
