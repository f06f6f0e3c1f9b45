//! # Integration Tests
//!
//! The miner wired to [`block_miner::InMemoryChain`] and
//! [`block_miner::InMemoryMempool`], observed through its event bus.

mod lifecycle;
mod scenarios;
