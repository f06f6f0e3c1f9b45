//! Adapters for the outbound ports
//!
//! - [`hash_engine`]: stock proof-of-work engines (SHA-256d, double BLAKE3)
//! - [`memory`]: in-memory chain and mempool for embedding and tests

pub mod hash_engine;
pub mod memory;

pub use hash_engine::{Blake3dEngine, Sha256dEngine};
pub use memory::{InMemoryChain, InMemoryMempool};
