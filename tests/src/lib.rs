//! # Block Miner Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── benchmarks/       # Criterion benchmarks (burst throughput, hashing)
//! │   └── mining.rs
//! │
//! └── integration/      # Miner driven against the in-memory chain and mempool
//!     ├── fixtures.rs   # Harness, scripted engines, wait helpers
//!     ├── scenarios.rs  # Mining scenarios end to end
//!     └── lifecycle.rs  # start/stop, subscriptions, hashrate
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p miner-tests
//!
//! # By category
//! cargo test -p miner-tests integration::scenarios
//! cargo test -p miner-tests integration::lifecycle
//!
//! # With miner logs
//! RUST_LOG=block_miner=debug cargo test -p miner-tests -- --nocapture
//!
//! # Benchmarks
//! cargo bench -p miner-tests
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod benchmarks;
pub mod integration;
