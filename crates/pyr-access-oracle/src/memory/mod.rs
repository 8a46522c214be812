//! In-process oracle implementations for tests and local runs.

pub mod ledger;
pub mod storage;

pub use ledger::{block_hash, MemoryLedger};
pub use storage::{MemoryStorage, MemoryStorageNetwork};
