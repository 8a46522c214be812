//! Shared handles every protocol component works against.

use std::sync::Arc;

use pyr_access_core::{Address, PeerId};
use pyr_access_net::Transport;
use pyr_access_oracle::{ContractCache, Ledger, Storage};
use pyr_access_store::AccessStore;

use crate::config::AccessConfig;

/// The local peer's identity, configuration and external collaborators.
///
/// All collaborators are safe for concurrent use; components hold the
/// context behind an `Arc` and run many flows against it at once.
pub struct PeerContext {
    /// Ledger account the local peer signs claims and transactions with.
    pub account: Address,
    pub config: AccessConfig,
    pub ledger: Arc<dyn Ledger>,
    pub storage: Arc<dyn Storage>,
    pub transport: Arc<dyn Transport>,
    pub store: Arc<dyn AccessStore>,
    /// Content contract handles, populated lazily.
    pub contracts: ContractCache,
}

impl PeerContext {
    pub fn new(
        account: Address,
        config: AccessConfig,
        ledger: Arc<dyn Ledger>,
        storage: Arc<dyn Storage>,
        transport: Arc<dyn Transport>,
        store: Arc<dyn AccessStore>,
    ) -> Self {
        let contracts = ContractCache::new(Arc::clone(&ledger));
        Self {
            account,
            config,
            ledger,
            storage,
            transport,
            store,
            contracts,
        }
    }

    /// Transport identity of the local peer.
    pub fn peer_id(&self) -> PeerId {
        self.transport.local_peer_id()
    }
}
