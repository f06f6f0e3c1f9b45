//! # Block Miner Benchmarks
//!
//! Performance benchmarks for the nonce search hot path.
