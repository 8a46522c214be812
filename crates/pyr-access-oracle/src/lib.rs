//! # Pyr Access Oracles
//!
//! The two external collaborators of the access-grant protocol, expressed as
//! narrow async traits:
//!
//! - [`Ledger`] - block headers, claim signing and signer recovery, token
//!   balances, content metadata, publish events and content transactions
//! - [`Storage`] - content buckets: create, upload, share, join, list, open
//!
//! [`ContractCache`] keeps one lazily created [`ContentContract`] handle per
//! content id for the lifetime of the process.
//!
//! The [`memory`] module provides [`MemoryLedger`] and [`MemoryStorage`],
//! in-process implementations used by tests and local runs.

pub mod contracts;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod storage;

pub use contracts::{ContentContract, ContractCache};
pub use error::{LedgerError, StorageError};
pub use ledger::{ContentMetadata, Ledger, NewContent, PublishEvent};
pub use memory::{MemoryLedger, MemoryStorage, MemoryStorageNetwork};
pub use storage::{BucketEntry, BucketHandle, BucketShare, FileSource, PutEvent, Storage};
