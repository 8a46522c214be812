//! # Pyr Access Net
//!
//! The transport substrate the access-grant protocol runs over.
//!
//! ## Overview
//!
//! Two primitives:
//!
//! - **Discovery channel**: topic-based publish/subscribe. Claims are
//!   broadcast on the topic named after the content id.
//! - **Direct channel**: point-to-point streams opened by dialing a peer on a
//!   named protocol. Grant packages travel here as one framed write, read to
//!   end-of-stream by the receiver.
//!
//! The sender identity of every inbound message is supplied by the transport.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use pyr_access_core::PeerId;
//! use pyr_access_net::{MemoryNetwork, Transport};
//!
//! async fn example() {
//!     let network = MemoryNetwork::new();
//!     let a = network.create_transport(PeerId::random());
//!     let b = network.create_transport(PeerId::random());
//!
//!     let mut sub = b.subscribe("0xABC").await.unwrap();
//!     a.publish("0xABC", Bytes::from_static(b"{}")).await.unwrap();
//!     let msg = sub.recv().await.unwrap();
//!     assert_eq!(msg.from, a.local_peer_id());
//! }
//! ```

pub mod error;
pub mod memory;
pub mod transport;

pub use error::{Result, TransportError};
pub use memory::{MemoryNetwork, MemoryTransport};
pub use transport::{InboundStream, OutboundStream, PubSubMessage, StreamListener, Subscription, Transport};
