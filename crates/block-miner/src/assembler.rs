//! Candidate block assembly
//!
//! Reads the chain tip, accounts digest and next target from the chain,
//! a transaction snapshot from the mempool, the wall clock and a random seed
//! nonce, in that order. No retries: a failure propagates and the controller
//! waits for the next trigger.

use crate::domain::{Address, Block, BlockBody, BlockHeader};
use crate::error::Result;
use crate::ports::{ChainOracle, TransactionSource};
use crate::SEED_NONCE_RANGE;
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type SeedSource = Arc<dyn Fn() -> u32 + Send + Sync>;

/// Builds candidate blocks from current chain and mempool state
#[derive(Clone)]
pub struct BlockAssembler {
    chain: Arc<dyn ChainOracle>,
    mempool: Arc<dyn TransactionSource>,
    max_transactions: u32,
    seed_source: SeedSource,
}

impl BlockAssembler {
    /// Create an assembler drawing seed nonces uniformly from `0..=SEED_NONCE_RANGE`
    pub fn new(
        chain: Arc<dyn ChainOracle>,
        mempool: Arc<dyn TransactionSource>,
        max_transactions: u32,
    ) -> Self {
        Self {
            chain,
            mempool,
            max_transactions,
            seed_source: Arc::new(|| rand::thread_rng().gen_range(0..=SEED_NONCE_RANGE)),
        }
    }

    /// Replace the seed nonce source
    pub fn with_seed_source<F>(mut self, source: F) -> Self
    where
        F: Fn() -> u32 + Send + Sync + 'static,
    {
        self.seed_source = Arc::new(source);
        self
    }

    /// Assemble a candidate paying out to `miner`
    #[tracing::instrument(skip_all, fields(miner = %miner))]
    pub async fn assemble(&self, miner: Address) -> Result<Block> {
        let prev_hash = self.chain.tip_hash().await?;
        let accounts_hash = self.chain.accounts_hash().await?;
        let difficulty = self.chain.next_target().await?;

        let transactions = self
            .mempool
            .eligible_transactions(self.max_transactions)
            .await?;
        let body = BlockBody::new(miner, transactions);

        let timestamp = chrono::Utc::now().timestamp().max(0) as u64;
        let nonce = (self.seed_source)();

        let header = BlockHeader {
            prev_hash,
            body_hash: body.hash(),
            accounts_hash,
            difficulty,
            timestamp,
            nonce,
        };

        debug!(
            tx_count = body.transaction_count(),
            seed = nonce,
            "Candidate assembled"
        );

        Ok(Block { header, body })
    }
}

impl fmt::Debug for BlockAssembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockAssembler")
            .field("max_transactions", &self.max_transactions)
            .finish_non_exhaustive()
    }
}
