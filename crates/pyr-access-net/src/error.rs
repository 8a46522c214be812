//! Error types for the transport layer.

use pyr_access_core::PeerId;
use thiserror::Error;

/// Errors that can occur on the discovery or direct channel.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer is not reachable.
    #[error("peer not found: {0}")]
    PeerNotFound(PeerId),

    /// The peer does not handle this protocol.
    #[error("peer {peer} does not support protocol {protocol}")]
    ProtocolNotSupported { peer: PeerId, protocol: String },

    /// A handler for this protocol is already registered locally.
    #[error("protocol already handled: {0}")]
    AlreadyHandled(String),

    /// The remote end closed the stream or subscription.
    #[error("channel closed")]
    ChannelClosed,

    /// An inbound stream exceeded the reader's size limit.
    #[error("message too large: limit {limit} bytes")]
    MessageTooLarge { limit: usize },

    /// The local transport is not connected.
    #[error("transport offline")]
    Offline,
}

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
