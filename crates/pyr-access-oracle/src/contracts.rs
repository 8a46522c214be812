//! Read-through cache of content contract handles.
//!
//! Content ids are permanent once known, so handles are created on first
//! reference and never evicted. A handle also memoizes the content's
//! metadata, which is fixed at publish time.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{OnceCell, RwLock};

use pyr_access_core::{Address, ContentId};

use crate::ledger::{ContentMetadata, Ledger, Result};

/// Handle to one content item's entitlement contract.
pub struct ContentContract {
    id: ContentId,
    ledger: Arc<dyn Ledger>,
    metadata: OnceCell<ContentMetadata>,
}

impl ContentContract {
    fn new(id: ContentId, ledger: Arc<dyn Ledger>) -> Self {
        Self {
            id,
            ledger,
            metadata: OnceCell::new(),
        }
    }

    /// The contract's content id.
    pub fn id(&self) -> &ContentId {
        &self.id
    }

    /// Token balance of `account`. Never cached.
    pub async fn balance_of(&self, account: &Address) -> Result<u64> {
        self.ledger.token_balance(account, &self.id).await
    }

    /// Content metadata, fetched once per handle.
    pub async fn metadata(&self) -> Result<&ContentMetadata> {
        self.metadata
            .get_or_try_init(|| self.ledger.content_metadata(&self.id))
            .await
    }
}

/// Process-lifetime map from content id to contract handle.
pub struct ContractCache {
    ledger: Arc<dyn Ledger>,
    contracts: RwLock<HashMap<ContentId, Arc<ContentContract>>>,
}

impl ContractCache {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self {
            ledger,
            contracts: RwLock::new(HashMap::new()),
        }
    }

    /// Get the handle for `id`, creating it on first reference.
    pub async fn ensure(&self, id: &ContentId) -> Arc<ContentContract> {
        if let Some(contract) = self.contracts.read().await.get(id) {
            return Arc::clone(contract);
        }

        let mut contracts = self.contracts.write().await;
        Arc::clone(contracts.entry(id.clone()).or_insert_with(|| {
            Arc::new(ContentContract::new(id.clone(), Arc::clone(&self.ledger)))
        }))
    }

    /// Number of cached handles.
    pub async fn len(&self) -> usize {
        self.contracts.read().await.len()
    }

    /// Whether no handle has been created yet.
    pub async fn is_empty(&self) -> bool {
        self.contracts.read().await.is_empty()
    }
}
