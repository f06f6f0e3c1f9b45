//! Utility modules for the miner

pub mod hashing;

pub use hashing::*;
