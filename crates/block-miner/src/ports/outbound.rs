//! Outbound ports (driven side - SPI)
//!
//! The chain, the mempool and the hash function are collaborators; the
//! miner only sees them through these traits.

use crate::domain::{Block, BlockHeader, Transaction};
use crate::error::Result;
use crate::events::{ChainEvent, MempoolEvent};
use crate::utils::hashing::meets_target;
use async_trait::async_trait;
use primitive_types::{H256, U256};
use shared_bus::Subscription;

/// Port: Current chain state and block acceptance
#[async_trait]
pub trait ChainOracle: Send + Sync {
    /// Hash of the current chain tip
    async fn tip_hash(&self) -> Result<H256>;

    /// Accounts-state digest at the current tip
    async fn accounts_hash(&self) -> Result<H256>;

    /// Target the next block must meet
    async fn next_target(&self) -> Result<U256>;

    /// Hand a mined block to the chain for validation and acceptance
    async fn submit_block(&self, block: Block) -> Result<()>;

    /// Subscribe to head-changed notifications. Dropping the handle unsubscribes.
    fn subscribe(&self) -> Subscription<ChainEvent>;
}

/// Port: Eligible transactions from the mempool
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Snapshot of transactions for inclusion, at most `max_count`, in the
    /// order they should appear in the block
    async fn eligible_transactions(&self, max_count: u32) -> Result<Vec<Transaction>>;

    /// Subscribe to readiness and admission notifications.
    /// Dropping the handle unsubscribes.
    fn subscribe(&self) -> Subscription<MempoolEvent>;
}

/// Port: Proof-of-work hash function
///
/// Pure and total over well-formed headers.
pub trait HashEngine: Send + Sync {
    /// PoW hash of the header
    fn pow_hash(&self, header: &BlockHeader) -> H256;

    /// Whether the header's PoW hash is below its target
    fn verify_proof_of_work(&self, header: &BlockHeader) -> bool {
        meets_target(&self.pow_hash(header), header.difficulty)
    }
}
