//! Inbound ports (driving side - API)

use crate::domain::{Address, MinerState};
use async_trait::async_trait;
use primitive_types::H256;

/// Primary port: miner lifecycle and queries
///
/// Mining results are only observable through the event bus and the
/// queries; `start` and `stop` never fail.
#[async_trait]
pub trait MinerService: Send + Sync {
    /// Start mining, optionally replacing the payout address.
    /// No-op with a warning when already working.
    async fn start(&self, address: Option<Address>);

    /// Stop mining. No-op with a warning when idle.
    async fn stop(&self);

    /// Whether the miner is working
    fn is_working(&self) -> bool;

    /// Last sampled hashrate in H/s
    fn hashrate(&self) -> f64;

    /// Payout address
    fn miner_address(&self) -> Address;

    /// Snapshot of the miner status
    fn status(&self) -> MinerStatus;
}

/// Miner status
#[derive(Clone, Debug, PartialEq)]
pub struct MinerStatus {
    /// Lifecycle state
    pub state: MinerState,

    /// Payout address
    pub address: Address,

    /// Last sampled hashrate in H/s
    pub hashrate: f64,

    /// Blocks mined since construction
    pub blocks_mined: u64,

    /// Search sessions launched since construction
    pub sessions_started: u64,

    /// Hash of the last mined block
    pub last_mined: Option<H256>,
}
