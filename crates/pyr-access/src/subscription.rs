//! Subscription Manager: keeps one discovery-topic listener per tracked item.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use pyr_access_core::{ContentId, ContentItem};
use pyr_access_net::Subscription;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::context::PeerContext;
use crate::error::Result;
use crate::verify::{ClaimOutcome, Verifier};

/// Owns the listener task for every subscribed topic.
///
/// Subscriptions are only ever added. An item that stops being tracked
/// keeps its listener for the life of the node.
pub struct SubscriptionManager {
    ctx: Arc<PeerContext>,
    verifier: Arc<Verifier>,
    active: Mutex<HashMap<ContentId, JoinHandle<()>>>,
}

impl SubscriptionManager {
    pub fn new(ctx: Arc<PeerContext>, verifier: Arc<Verifier>) -> Self {
        Self {
            ctx,
            verifier,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribe to the topic of every item not yet listened to.
    ///
    /// Items are deduplicated by id. Returns the ids newly subscribed, in
    /// order. Concurrent calls never subscribe the same topic twice.
    pub async fn resync(&self, items: &[ContentItem]) -> Result<Vec<ContentId>> {
        let wanted: BTreeSet<&ContentId> = items.iter().map(|item| &item.id).collect();

        let mut active = self.active.lock().await;
        let mut added = Vec::new();
        for id in wanted {
            if active.contains_key(id) {
                continue;
            }

            let subscription = self.ctx.transport.subscribe(id.topic()).await?;
            let handle = tokio::spawn(listen(subscription, Arc::clone(&self.verifier)));
            active.insert(id.clone(), handle);
            added.push(id.clone());
        }

        if !added.is_empty() {
            tracing::debug!(added = added.len(), total = active.len(), "subscriptions resynced");
        }
        Ok(added)
    }

    /// Whether a listener is running for `id`.
    pub async fn is_subscribed(&self, id: &ContentId) -> bool {
        self.active.lock().await.contains_key(id)
    }

    /// Number of subscribed topics.
    pub async fn len(&self) -> usize {
        self.active.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.active.lock().await.is_empty()
    }

    /// Stop every listener.
    pub async fn shutdown(&self) {
        let mut active = self.active.lock().await;
        for (_, handle) in active.drain() {
            handle.abort();
        }
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        for handle in self.active.get_mut().values() {
            handle.abort();
        }
    }
}

/// Drain one topic, judging each claim on its own task.
async fn listen(mut subscription: Subscription, verifier: Arc<Verifier>) {
    while let Some(message) = subscription.recv().await {
        let verifier = Arc::clone(&verifier);
        let span = tracing::debug_span!("claim", topic = %message.topic, from = %message.from);
        tokio::spawn(
            async move {
                match verifier.on_message(&message).await {
                    Ok(ClaimOutcome::Granted { signer, .. }) => {
                        tracing::debug!(%signer, "claim granted");
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "claim processing failed"),
                }
            }
            .instrument(span),
        );
    }
    tracing::debug!(topic = subscription.topic(), "subscription closed");
}
