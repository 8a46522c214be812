//! # Pyr Access Store
//!
//! The Access State Store: the process-resident record of every content
//! item the local peer tracks, with its role flags and fetch progress.
//!
//! ## Key Types
//!
//! - [`AccessStore`] - The async trait all store mutators and readers go through
//! - [`MemoryStore`] - In-memory implementation with per-item locking
//! - [`TrackResult`] - Outcome of tracking an item
//!
//! ## Design Notes
//!
//! - **Idempotent tracking**: tracking an id twice yields one record; roles accumulate
//! - **Atomic check-then-insert**: concurrent `track` calls for one id never duplicate it
//! - **Per-item mutual exclusion**: state transitions on one item are serialized,
//!   transitions on different items never contend
//! - **Validated transitions**: illegal fetch-state moves are rejected, not applied
//!
//! Nothing here is persisted; the store is rebuilt from the ledger on restart.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use traits::{AccessStore, TrackResult};
