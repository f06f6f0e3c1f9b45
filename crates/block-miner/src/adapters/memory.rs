//! In-memory chain and mempool
//!
//! Test-grade collaborators implementing the outbound ports. The chain
//! accepts any block whose parent is the current tip and makes it the new
//! tip; it does not validate proof of work or transactions. The mempool
//! hands out transactions in admission order.

use crate::domain::{Block, Transaction};
use crate::error::{MinerError, Result};
use crate::events::{ChainEvent, MempoolEvent};
use crate::ports::{ChainOracle, TransactionSource};
use async_trait::async_trait;
use parking_lot::RwLock;
use primitive_types::{H256, U256};
use shared_bus::{EventFilter, InMemoryEventBus, Subscription};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::debug;

// ============================================================================
// CHAIN
// ============================================================================

/// In-memory chain oracle
pub struct InMemoryChain {
    head: RwLock<H256>,
    accounts_hash: RwLock<H256>,
    target: RwLock<U256>,
    submitted: RwLock<Vec<Block>>,
    accepted: RwLock<Vec<Block>>,
    available: AtomicBool,
    reject_blocks: AtomicBool,
    tip_queries: AtomicU64,
    events: InMemoryEventBus<ChainEvent>,
}

impl InMemoryChain {
    /// Chain whose tip is `head`, asking for `target` on the next block
    pub fn new(head: H256, target: U256) -> Self {
        Self {
            head: RwLock::new(head),
            accounts_hash: RwLock::new(H256::zero()),
            target: RwLock::new(target),
            submitted: RwLock::new(Vec::new()),
            accepted: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
            reject_blocks: AtomicBool::new(false),
            tip_queries: AtomicU64::new(0),
            events: InMemoryEventBus::new(),
        }
    }

    /// Move the tip and announce it
    pub fn set_head(&self, hash: H256) {
        *self.head.write() = hash;
        self.events.send(ChainEvent::HeadChanged { hash });
    }

    /// Current tip
    pub fn head(&self) -> H256 {
        *self.head.read()
    }

    /// Set the accounts-state digest
    pub fn set_accounts_hash(&self, hash: H256) {
        *self.accounts_hash.write() = hash;
    }

    /// Set the target for the next block
    pub fn set_target(&self, target: U256) {
        *self.target.write() = target;
    }

    /// Make every query fail with `ChainUnavailable` while false
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Refuse every submitted block while true
    pub fn set_reject_blocks(&self, reject: bool) {
        self.reject_blocks.store(reject, Ordering::SeqCst);
    }

    /// Every block handed to `submit_block`, accepted or not
    pub fn submitted_blocks(&self) -> Vec<Block> {
        self.submitted.read().clone()
    }

    /// Blocks that became the tip
    pub fn accepted_blocks(&self) -> Vec<Block> {
        self.accepted.read().clone()
    }

    /// Number of `submit_block` calls
    pub fn submission_count(&self) -> usize {
        self.submitted.read().len()
    }

    /// Number of `tip_hash` calls
    pub fn tip_queries(&self) -> u64 {
        self.tip_queries.load(Ordering::Relaxed)
    }

    /// Bus carrying this chain's notifications
    pub fn event_bus(&self) -> &InMemoryEventBus<ChainEvent> {
        &self.events
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(MinerError::ChainUnavailable("chain offline".to_string()))
        }
    }
}

#[async_trait]
impl ChainOracle for InMemoryChain {
    async fn tip_hash(&self) -> Result<H256> {
        self.tip_queries.fetch_add(1, Ordering::Relaxed);
        self.ensure_available()?;
        Ok(self.head())
    }

    async fn accounts_hash(&self) -> Result<H256> {
        self.ensure_available()?;
        Ok(*self.accounts_hash.read())
    }

    async fn next_target(&self) -> Result<U256> {
        self.ensure_available()?;
        Ok(*self.target.read())
    }

    async fn submit_block(&self, block: Block) -> Result<()> {
        self.submitted.write().push(block.clone());
        self.ensure_available()?;

        if self.reject_blocks.load(Ordering::SeqCst) {
            return Err(MinerError::SubmissionRejected(
                "block refused by chain".to_string(),
            ));
        }

        let head = self.head();
        if block.prev_hash() != head {
            return Err(MinerError::SubmissionRejected(format!(
                "stale parent {:?}, tip is {:?}",
                block.prev_hash(),
                head
            )));
        }

        let hash = block.hash();
        self.accepted.write().push(block);
        debug!(hash = ?hash, "Block accepted");
        self.set_head(hash);
        Ok(())
    }

    fn subscribe(&self) -> Subscription<ChainEvent> {
        self.events.subscribe(EventFilter::all())
    }
}

// ============================================================================
// MEMPOOL
// ============================================================================

/// In-memory transaction source
pub struct InMemoryMempool {
    transactions: RwLock<Vec<Transaction>>,
    available: AtomicBool,
    events: InMemoryEventBus<MempoolEvent>,
}

impl Default for InMemoryMempool {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMempool {
    /// Empty mempool
    pub fn new() -> Self {
        Self {
            transactions: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
            events: InMemoryEventBus::new(),
        }
    }

    /// Admit a transaction and announce it
    pub fn add_transaction(&self, tx: Transaction) {
        let hash = tx.hash();
        self.transactions.write().push(tx);
        self.events.send(MempoolEvent::TransactionAdded { hash });
    }

    /// Announce that the selection is ready
    pub fn notify_ready(&self) {
        self.events.send(MempoolEvent::TransactionsReady);
    }

    /// Drop every transaction
    pub fn clear(&self) {
        self.transactions.write().clear();
    }

    /// Number of pending transactions
    pub fn len(&self) -> usize {
        self.transactions.read().len()
    }

    /// Whether no transaction is pending
    pub fn is_empty(&self) -> bool {
        self.transactions.read().is_empty()
    }

    /// Make snapshots fail with `MempoolUnavailable` while false
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Bus carrying this mempool's notifications
    pub fn event_bus(&self) -> &InMemoryEventBus<MempoolEvent> {
        &self.events
    }
}

#[async_trait]
impl TransactionSource for InMemoryMempool {
    async fn eligible_transactions(&self, max_count: u32) -> Result<Vec<Transaction>> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(MinerError::MempoolUnavailable(
                "mempool offline".to_string(),
            ));
        }
        let txs = self.transactions.read();
        Ok(txs.iter().take(max_count as usize).cloned().collect())
    }

    fn subscribe(&self) -> Subscription<MempoolEvent> {
        self.events.subscribe(EventFilter::all())
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================
