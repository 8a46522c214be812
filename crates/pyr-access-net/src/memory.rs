//! A simple in-memory transport.
//!
//! Uses channels to simulate gossip topics and direct streams between
//! peers in one process. Publishing delivers to every subscriber of the
//! topic, the publisher included.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{mpsc, RwLock};

use pyr_access_core::PeerId;

use crate::error::{Result, TransportError};
use crate::transport::{
    InboundStream, OutboundStream, PubSubMessage, StreamListener, Subscription, Transport,
};

const CHANNEL_CAPACITY: usize = 1000;

/// Shared state for the memory transport network.
#[derive(Default)]
pub struct MemoryNetwork {
    /// Subscribers per topic.
    topics: RwLock<HashMap<String, Vec<mpsc::Sender<PubSubMessage>>>>,
    /// Stream handlers per (peer, protocol).
    handlers: RwLock<HashMap<(PeerId, String), mpsc::Sender<InboundStream>>>,
    /// Peers whose transport is disconnected.
    offline: RwLock<HashSet<PeerId>>,
    /// Successful dials, across all peers.
    dials: AtomicUsize,
}

impl MemoryNetwork {
    /// Create a new memory network.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create a transport connected to this network.
    pub fn create_transport(self: &Arc<Self>, peer_id: PeerId) -> MemoryTransport {
        MemoryTransport {
            peer_id,
            network: Arc::clone(self),
        }
    }

    /// Disconnect (or reconnect) a peer. Offline peers can neither send nor be dialed.
    pub async fn set_online(&self, peer: PeerId, online: bool) {
        let mut offline = self.offline.write().await;
        if online {
            offline.remove(&peer);
        } else {
            offline.insert(peer);
        }
    }

    /// Number of direct streams opened so far.
    pub fn dial_count(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    /// Number of live subscriptions on `topic`.
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .await
            .get(topic)
            .map(|subs| subs.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    async fn is_online(&self, peer: &PeerId) -> bool {
        !self.offline.read().await.contains(peer)
    }
}

/// In-memory transport implementation.
pub struct MemoryTransport {
    peer_id: PeerId,
    network: Arc<MemoryNetwork>,
}

#[async_trait]
impl Transport for MemoryTransport {
    fn local_peer_id(&self) -> PeerId {
        self.peer_id
    }

    async fn publish(&self, topic: &str, data: Bytes) -> Result<()> {
        if !self.network.is_online(&self.peer_id).await {
            return Err(TransportError::Offline);
        }

        let subscribers = self
            .network
            .topics
            .read()
            .await
            .get(topic)
            .cloned()
            .unwrap_or_default();

        for tx in subscribers {
            let message = PubSubMessage {
                from: self.peer_id,
                topic: topic.to_string(),
                data: data.clone(),
            };
            if tx.send(message).await.is_err() {
                tracing::trace!(topic, "skipping dropped subscriber");
            }
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let mut topics = self.network.topics.write().await;
        let subscribers = topics.entry(topic.to_string()).or_default();
        subscribers.retain(|s| !s.is_closed());
        subscribers.push(tx);
        Ok(Subscription::new(topic, rx))
    }

    async fn dial(&self, peer: &PeerId, protocol: &str) -> Result<OutboundStream> {
        if !self.network.is_online(&self.peer_id).await {
            return Err(TransportError::Offline);
        }
        if !self.network.is_online(peer).await {
            return Err(TransportError::PeerNotFound(*peer));
        }

        let handler = self
            .network
            .handlers
            .read()
            .await
            .get(&(*peer, protocol.to_string()))
            .cloned()
            .ok_or_else(|| TransportError::ProtocolNotSupported {
                peer: *peer,
                protocol: protocol.to_string(),
            })?;

        let (tx, rx) = mpsc::channel(16);
        handler
            .send(InboundStream::new(self.peer_id, protocol, rx))
            .await
            .map_err(|_| TransportError::PeerNotFound(*peer))?;

        self.network.dials.fetch_add(1, Ordering::SeqCst);
        Ok(OutboundStream::new(*peer, tx))
    }

    async fn handle(&self, protocol: &str) -> Result<StreamListener> {
        let mut handlers = self.network.handlers.write().await;
        let key = (self.peer_id, protocol.to_string());
        if handlers.get(&key).is_some_and(|tx| !tx.is_closed()) {
            return Err(TransportError::AlreadyHandled(protocol.to_string()));
        }

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        handlers.insert(key, tx);
        Ok(StreamListener::new(protocol, rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let network = MemoryNetwork::new();
        let a = network.create_transport(PeerId::from_bytes([0xAA; 32]));
        let b = network.create_transport(PeerId::from_bytes([0xBB; 32]));
        let c = network.create_transport(PeerId::from_bytes([0xCC; 32]));

        let mut sub_a = a.subscribe("0xABC").await.unwrap();
        let mut sub_b = b.subscribe("0xABC").await.unwrap();
        let mut sub_c = c.subscribe("other").await.unwrap();

        a.publish("0xABC", Bytes::from_static(b"hi")).await.unwrap();

        let to_b = sub_b.recv().await.unwrap();
        assert_eq!(to_b.from, a.local_peer_id());
        assert_eq!(to_b.data, Bytes::from_static(b"hi"));

        // Publisher sees its own message
        let to_a = sub_a.recv().await.unwrap();
        assert_eq!(to_a.from, a.local_peer_id());

        // Subscribers of other topics only see their own topic
        c.publish("other", Bytes::from_static(b"x")).await.unwrap();
        assert_eq!(sub_c.recv().await.unwrap().data, Bytes::from_static(b"x"));
    }

    #[tokio::test]
    async fn test_direct_stream_read_to_end() {
        let network = MemoryNetwork::new();
        let a = network.create_transport(PeerId::from_bytes([0xAA; 32]));
        let b = network.create_transport(PeerId::from_bytes([0xBB; 32]));

        let mut listener = b.handle("/sharedBucket").await.unwrap();
        let stream = a.dial(&b.local_peer_id(), "/sharedBucket").await.unwrap();
        stream.write(Bytes::from_static(b"hello ")).await.unwrap();
        stream.write(Bytes::from_static(b"world")).await.unwrap();
        stream.close();

        let inbound = listener.accept().await.unwrap();
        assert_eq!(inbound.remote_peer(), a.local_peer_id());
        let body = inbound.read_to_end(1024).await.unwrap();
        assert_eq!(body, Bytes::from_static(b"hello world"));
        assert_eq!(network.dial_count(), 1);
    }

    #[tokio::test]
    async fn test_read_to_end_enforces_limit() {
        let network = MemoryNetwork::new();
        let a = network.create_transport(PeerId::from_bytes([0xAA; 32]));
        let b = network.create_transport(PeerId::from_bytes([0xBB; 32]));

        let mut listener = b.handle("/p").await.unwrap();
        let stream = a.dial(&b.local_peer_id(), "/p").await.unwrap();
        stream.write(Bytes::from(vec![0u8; 64])).await.unwrap();
        stream.close();

        let inbound = listener.accept().await.unwrap();
        assert!(matches!(
            inbound.read_to_end(10).await,
            Err(TransportError::MessageTooLarge { limit: 10 })
        ));
    }

    #[tokio::test]
    async fn test_dial_without_handler_fails() {
        let network = MemoryNetwork::new();
        let a = network.create_transport(PeerId::from_bytes([0xAA; 32]));
        let b = PeerId::from_bytes([0xBB; 32]);

        assert!(matches!(
            a.dial(&b, "/sharedBucket").await,
            Err(TransportError::ProtocolNotSupported { .. })
        ));
        assert_eq!(network.dial_count(), 0);
    }

    #[tokio::test]
    async fn test_offline_peer_cannot_publish_or_be_dialed() {
        let network = MemoryNetwork::new();
        let a = network.create_transport(PeerId::from_bytes([0xAA; 32]));
        let b = network.create_transport(PeerId::from_bytes([0xBB; 32]));
        let _listener = b.handle("/p").await.unwrap();

        network.set_online(b.local_peer_id(), false).await;
        assert!(matches!(
            b.publish("t", Bytes::new()).await,
            Err(TransportError::Offline)
        ));
        assert!(matches!(
            a.dial(&b.local_peer_id(), "/p").await,
            Err(TransportError::PeerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_handler_rejected() {
        let network = MemoryNetwork::new();
        let a = network.create_transport(PeerId::from_bytes([0xAA; 32]));

        let _listener = a.handle("/p").await.unwrap();
        assert!(matches!(
            a.handle("/p").await,
            Err(TransportError::AlreadyHandled(_))
        ));
    }
}
