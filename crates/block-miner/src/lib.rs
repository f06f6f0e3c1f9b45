//! # Block Miner
//!
//! **Bounded Context:** Block Mining
//! **Architecture Compliance:** DDD + Hexagonal + EDA + TDD
//!
//! ## Purpose
//!
//! Keeps a node producing proof-of-work blocks on top of the current chain
//! tip:
//! - Assembles a candidate from the tip, the accounts digest, the next
//!   target and a mempool snapshot
//! - Searches nonces in short bursts, yielding to the runtime in between
//! - Abandons a candidate as soon as the tip moves
//! - Submits found blocks and reports hashrate
//!
//! ## Key Design Principles
//!
//! 1. **Cancel, never queue**: every trigger replaces the running search
//! 2. **One session**: at most one search is live at any time
//! 3. **Cooperative**: bounded bursts keep cancellation latency at one burst
//! 4. **Notifications only**: published events never drive the miner itself
//!
//! ## Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Adapters (Outer)                                   │
//! │  - Hash engines: SHA-256d, double BLAKE3            │
//! │  - In-memory chain and mempool                      │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Ports (Middle)                                     │
//! │  - Inbound: MinerService                            │
//! │  - Outbound: ChainOracle, TransactionSource,        │
//! │    HashEngine                                       │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain (Inner - Pure Logic)                        │
//! │  - Block, BlockHeader, BlockBody                    │
//! │  - SearchSession (burst nonce search)               │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Critical Invariants
//!
//! 1. **Target**: a mined block's PoW hash is strictly below its target
//! 2. **Tip binding**: a mined block's parent is the tip captured at assembly
//! 3. **Nonce order**: nonces are tried strictly increasing from the seed
//! 4. **Idle is quiet**: no subscriptions and no sampler while idle
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! let miner = ConcreteMiner::builder(chain, mempool)
//!     .config(MinerConfig::default())
//!     .address(payout)
//!     .build()?;
//!
//! let mut mined = miner.subscribe(EventFilter::topics(vec![MinerTopic::BlockMined]));
//! miner.start(None).await;
//! ```
//!
//! ## Module Structure
//!
//! - [`domain`]: Entities and the nonce search session
//! - [`ports`]: Hexagonal architecture interfaces (inbound/outbound)
//! - [`adapters`]: Hash engines and in-memory collaborators
//! - [`events`]: Event schemas for EDA
//! - [`service`]: Lifecycle controller

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Hash engines and in-memory collaborators
pub mod adapters;
/// Candidate block assembly
pub mod assembler;
/// Domain models and business logic
pub mod domain;
/// Event type definitions
pub mod events;
pub mod ports;
pub mod service;
pub mod utils;

mod config;
mod error;
mod metrics;

pub use config::{HashAlgorithm, MinerConfig};
pub use error::{MinerError, Result};
pub use metrics::{HashrateTracker, Metrics};

// Re-export commonly used types
pub use domain::{
    Address, Block, BlockBody, BlockHeader, BurstOutcome, BurstReport, MinerState, SearchSession,
    Transaction,
};

pub use ports::{ChainOracle, HashEngine, MinerService, MinerStatus, TransactionSource};

pub use events::{
    ChainEvent, ChainTopic, MempoolEvent, MempoolTopic, MinerErrorEvent, MinerErrorKind,
    MinerEvent, MinerTopic,
};

pub use adapters::{Blake3dEngine, InMemoryChain, InMemoryMempool, Sha256dEngine};

pub use assembler::BlockAssembler;

pub use service::{ConcreteMiner, MinerBuilder, RestartReason};

/// Nonce attempts per burst before yielding to the runtime
pub const DEFAULT_BURST_ITERATIONS: u32 = 75;

/// Hashrate sampling period in seconds
pub const HASHRATE_PERIOD_SECS: u64 = 5;

/// Maximum transactions requested from the mempool per block
pub const MAX_BLOCK_TRANSACTIONS: u32 = 5000;

/// Seed nonces are drawn uniformly from `0..=SEED_NONCE_RANGE`
pub const SEED_NONCE_RANGE: u32 = 100_000;
