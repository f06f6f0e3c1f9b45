//! Metrics collection for the miner

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Shared attempt counter and the last sampled hashrate
///
/// The search loop only adds to the counter; only the sampler (or `stop`)
/// takes it back to zero.
#[derive(Debug, Default)]
pub struct HashrateTracker {
    /// Hashes attempted since the last sample
    hash_count: AtomicU64,

    /// Last sampled rate, stored as `f64` bits
    hashrate_bits: AtomicU64,
}

impl HashrateTracker {
    /// Create new tracker with zeroed counter and rate
    pub fn new() -> Self {
        Self::default()
    }

    /// Add attempted hashes
    #[inline]
    pub fn record_hashes(&self, count: u64) {
        self.hash_count.fetch_add(count, Ordering::Relaxed);
    }

    /// Hashes attempted since the last sample
    pub fn pending_hashes(&self) -> u64 {
        self.hash_count.load(Ordering::Relaxed)
    }

    /// Take the counter back to zero and store `count / period` as the rate
    pub fn sample(&self, period: Duration) -> f64 {
        let count = self.hash_count.swap(0, Ordering::AcqRel);
        let secs = period.as_secs_f64();
        let rate = if secs > 0.0 { count as f64 / secs } else { 0.0 };
        self.hashrate_bits.store(rate.to_bits(), Ordering::Release);
        rate
    }

    /// Last sampled rate in H/s
    pub fn current(&self) -> f64 {
        f64::from_bits(self.hashrate_bits.load(Ordering::Acquire))
    }

    /// Zero counter and rate
    pub fn reset(&self) {
        self.hash_count.store(0, Ordering::Release);
        self.hashrate_bits.store(0f64.to_bits(), Ordering::Release);
    }
}

/// Metrics collector for the miner
#[derive(Debug, Default)]
pub struct Metrics {
    /// Search sessions launched
    pub sessions_started: AtomicU64,

    /// Sessions that ended without a block (tip moved, cancelled, fault)
    pub sessions_aborted: AtomicU64,

    /// Blocks mined
    pub blocks_mined: AtomicU64,

    /// Transactions carried by mined blocks
    pub transactions_included: AtomicU64,

    /// Mined blocks the chain refused
    pub submission_failures: AtomicU64,

    /// Candidate assemblies that failed
    pub assembly_failures: AtomicU64,

    /// Hashes attempted over the miner's lifetime
    pub total_hashes: AtomicU64,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a session launch
    pub fn record_session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a session that ended without a block
    pub fn record_session_aborted(&self) {
        self.sessions_aborted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a mined block
    pub fn record_block_mined(&self, tx_count: usize) {
        self.blocks_mined.fetch_add(1, Ordering::Relaxed);
        self.transactions_included
            .fetch_add(tx_count as u64, Ordering::Relaxed);
    }

    /// Record a refused submission
    pub fn record_submission_failure(&self) {
        self.submission_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed assembly
    pub fn record_assembly_failure(&self) {
        self.assembly_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record attempted hashes
    pub fn record_hashes(&self, count: u64) {
        self.total_hashes.fetch_add(count, Ordering::Relaxed);
    }

    /// Get sessions started
    pub fn get_sessions_started(&self) -> u64 {
        self.sessions_started.load(Ordering::Relaxed)
    }

    /// Get sessions aborted
    pub fn get_sessions_aborted(&self) -> u64 {
        self.sessions_aborted.load(Ordering::Relaxed)
    }

    /// Get blocks mined
    pub fn get_blocks_mined(&self) -> u64 {
        self.blocks_mined.load(Ordering::Relaxed)
    }

    /// Get refused submissions
    pub fn get_submission_failures(&self) -> u64 {
        self.submission_failures.load(Ordering::Relaxed)
    }

    /// Get failed assemblies
    pub fn get_assembly_failures(&self) -> u64 {
        self.assembly_failures.load(Ordering::Relaxed)
    }

    /// Get lifetime hashes
    pub fn get_total_hashes(&self) -> u64 {
        self.total_hashes.load(Ordering::Relaxed)
    }

    /// Get average transactions per mined block
    pub fn get_avg_transactions_per_block(&self) -> f64 {
        let blocks = self.blocks_mined.load(Ordering::Relaxed);
        if blocks == 0 {
            return 0.0;
        }
        let txs = self.transactions_included.load(Ordering::Relaxed);
        txs as f64 / blocks as f64
    }
}
