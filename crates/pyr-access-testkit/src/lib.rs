//! # Pyr Access Testkit
//!
//! Testing utilities for the Pyr access protocol.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: A shared in-memory ledger, transport and storage network
//!   with helpers to spin up fully wired peers
//! - **Generators**: Proptest strategies for property-based testing
//! - **Tracing**: One-call log setup for tests
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use pyr_access_testkit::fixtures::TestNetwork;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let net = TestNetwork::new()?;
//!     let publisher = net.peer("publisher").await?;
//!     let collector = net.peer("collector").await?;
//!
//!     let id = publisher.publish_file("album", 10, "track.flac", b"audio").await?;
//!     collector.node.purchase(&id).await?;
//!     collector.node.request_access(&id).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! Set `RUST_LOG=pyr_access=debug` and call [`init_tracing`] at the top of
//! a test to see protocol decisions.

pub mod fixtures;
pub mod generators;

pub use fixtures::{settle, TestNetwork, TestPeer};

/// Install a test-friendly tracing subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
