//! Transport abstraction for discovery and credential exchange.
//!
//! Implementations may use libp2p gossipsub and streams, or any other
//! substrate; they hand received data to the protocol through the
//! channel-backed handles defined here.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::sync::mpsc;

use pyr_access_core::PeerId;

use crate::error::{Result, TransportError};

/// A message received on a subscribed topic.
#[derive(Debug, Clone)]
pub struct PubSubMessage {
    /// Sender identity, as authenticated by the transport.
    pub from: PeerId,
    pub topic: String,
    pub data: Bytes,
}

/// A live topic subscription.
pub struct Subscription {
    topic: String,
    rx: mpsc::Receiver<PubSubMessage>,
}

impl Subscription {
    pub fn new(topic: impl Into<String>, rx: mpsc::Receiver<PubSubMessage>) -> Self {
        Self {
            topic: topic.into(),
            rx,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Next message on the topic, or `None` once the transport drops it.
    pub async fn recv(&mut self) -> Option<PubSubMessage> {
        self.rx.recv().await
    }
}

/// Sending half of a direct stream.
pub struct OutboundStream {
    peer: PeerId,
    tx: mpsc::Sender<Bytes>,
}

impl OutboundStream {
    pub fn new(peer: PeerId, tx: mpsc::Sender<Bytes>) -> Self {
        Self { peer, tx }
    }

    pub fn peer(&self) -> PeerId {
        self.peer
    }

    /// Write one frame.
    pub async fn write(&self, data: Bytes) -> Result<()> {
        self.tx
            .send(data)
            .await
            .map_err(|_| TransportError::ChannelClosed)
    }

    /// Close the stream, signalling end-of-stream to the reader.
    pub fn close(self) {
        drop(self.tx);
    }
}

/// Receiving half of a direct stream, as seen by the dialed peer.
pub struct InboundStream {
    from: PeerId,
    protocol: String,
    rx: mpsc::Receiver<Bytes>,
}

impl InboundStream {
    pub fn new(from: PeerId, protocol: impl Into<String>, rx: mpsc::Receiver<Bytes>) -> Self {
        Self {
            from,
            protocol: protocol.into(),
            rx,
        }
    }

    /// Identity of the dialing peer.
    pub fn remote_peer(&self) -> PeerId {
        self.from
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Read every frame until end-of-stream.
    ///
    /// Fails with `MessageTooLarge` as soon as more than `limit` bytes arrive.
    pub async fn read_to_end(mut self, limit: usize) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.rx.recv().await {
            if buf.len() + chunk.len() > limit {
                return Err(TransportError::MessageTooLarge { limit });
            }
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }
}

/// Inbound streams for one registered protocol.
pub struct StreamListener {
    protocol: String,
    rx: mpsc::Receiver<InboundStream>,
}

impl StreamListener {
    pub fn new(protocol: impl Into<String>, rx: mpsc::Receiver<InboundStream>) -> Self {
        Self {
            protocol: protocol.into(),
            rx,
        }
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Next inbound stream, or `None` once the transport shuts down.
    pub async fn accept(&mut self) -> Option<InboundStream> {
        self.rx.recv().await
    }
}

/// Transport trait for the discovery and direct channels.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Get the local peer's identity.
    fn local_peer_id(&self) -> PeerId;

    /// Broadcast `data` to every subscriber of `topic`.
    async fn publish(&self, topic: &str, data: Bytes) -> Result<()>;

    /// Start listening on `topic`.
    async fn subscribe(&self, topic: &str) -> Result<Subscription>;

    /// Open a direct stream to `peer` on `protocol`.
    async fn dial(&self, peer: &PeerId, protocol: &str) -> Result<OutboundStream>;

    /// Accept inbound streams on `protocol`.
    async fn handle(&self, protocol: &str) -> Result<StreamListener>;
}
