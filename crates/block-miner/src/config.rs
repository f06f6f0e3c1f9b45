//! Configuration types for the miner

use crate::adapters::hash_engine::{Blake3dEngine, Sha256dEngine};
use crate::error::{MinerError, Result};
use crate::ports::HashEngine;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Runtime configuration for the miner
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Nonce attempts per burst before yielding (default: 75)
    ///
    /// Larger bursts raise the hashrate but delay the reaction to a
    /// competing block by up to one burst.
    pub burst_iterations: u32,

    /// Hashrate sampling period in seconds (default: 5)
    pub hashrate_period_secs: u64,

    /// Max transactions requested from the mempool per block (default: 5000)
    pub max_transactions: u32,

    /// Hash algorithm used by the stock engine
    pub algorithm: HashAlgorithm,

    /// Assemble and start searching as soon as `start` is called,
    /// without waiting for a mempool trigger (default: false)
    pub mine_on_start: bool,

    /// Also restart on the chain's head-changed notification (default: true)
    ///
    /// Turn off only when the mempool re-announces readiness after a head change.
    pub restart_on_head_change: bool,

    /// Capacity of the outbound event bus
    pub event_capacity: usize,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            burst_iterations: crate::DEFAULT_BURST_ITERATIONS,
            hashrate_period_secs: crate::HASHRATE_PERIOD_SECS,
            max_transactions: crate::MAX_BLOCK_TRANSACTIONS,
            algorithm: HashAlgorithm::Sha256d,
            mine_on_start: false,
            restart_on_head_change: true,
            event_capacity: shared_bus::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl MinerConfig {
    /// Reject values the miner cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.burst_iterations == 0 {
            return Err(MinerError::InvalidConfig(
                "burst_iterations must be at least 1".to_string(),
            ));
        }
        if self.hashrate_period_secs == 0 {
            return Err(MinerError::InvalidConfig(
                "hashrate_period_secs must be at least 1".to_string(),
            ));
        }
        if self.max_transactions == 0 {
            return Err(MinerError::InvalidConfig(
                "max_transactions must be at least 1".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(MinerError::InvalidConfig(
                "event_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Hashrate sampling period
    pub fn hashrate_period(&self) -> Duration {
        Duration::from_secs(self.hashrate_period_secs)
    }
}

/// Hash algorithm for PoW
#[derive(Copy, Clone, Debug, Deserialize, PartialEq, Eq)]
pub enum HashAlgorithm {
    /// SHA-256d (Bitcoin-style): sha256(sha256(header))
    #[serde(rename = "sha256d")]
    Sha256d,

    /// Double BLAKE3: blake3(blake3(header))
    #[serde(rename = "blake3d")]
    Blake3d,
}

impl HashAlgorithm {
    /// Stock engine for this algorithm
    pub fn engine(self) -> Arc<dyn HashEngine> {
        match self {
            Self::Sha256d => Arc::new(Sha256dEngine),
            Self::Blake3d => Arc::new(Blake3dEngine),
        }
    }
}
