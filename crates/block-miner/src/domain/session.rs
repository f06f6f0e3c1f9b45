//! Nonce search session
//!
//! One attempt to mine a specific candidate block. The session owns its
//! block outright; the only mutation during the search is the header nonce.
//!
//! ## Nonce Overflow
//!
//! Nonces are tried in strictly increasing order from the seed and never
//! wrap. Once `u32::MAX` has been tried without success the session reports
//! [`BurstOutcome::Exhausted`] and the caller reseeds with a fresh candidate.

use super::entities::Block;
use crate::ports::HashEngine;
use primitive_types::H256;
use uuid::Uuid;

/// What a burst ended with
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BurstOutcome {
    /// Current header satisfies the target
    Found,

    /// Burst finished without a solution; more nonces remain
    Continue,

    /// Top of the nonce field reached without a solution
    Exhausted,
}

/// Result of one burst
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BurstReport {
    /// How the burst ended
    pub outcome: BurstOutcome,

    /// Headers evaluated during this burst
    pub attempts: u32,
}

/// Mutable state of one nonce search
#[derive(Debug)]
pub struct SearchSession {
    id: Uuid,
    block: Block,
    seed: u32,
    attempts: u64,
}

impl SearchSession {
    /// Start a session on a freshly assembled candidate
    ///
    /// The candidate's current nonce is the seed and its parent hash is the
    /// tip the session is bound to.
    pub fn new(block: Block) -> Self {
        let seed = block.header.nonce;
        Self {
            id: Uuid::new_v4(),
            block,
            seed,
            attempts: 0,
        }
    }

    /// Session id (log correlation)
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Tip hash captured at assembly time
    pub fn captured_tip(&self) -> H256 {
        self.block.header.prev_hash
    }

    /// Seed nonce
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Headers evaluated so far
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Nonce that will be evaluated next (or the winning one after `Found`)
    pub fn nonce(&self) -> u32 {
        self.block.header.nonce
    }

    /// Candidate block
    pub fn block(&self) -> &Block {
        &self.block
    }

    /// Give up the block, ending the session
    pub fn into_block(self) -> Block {
        self.block
    }

    /// Evaluate up to `iterations` nonces
    ///
    /// On `Found` the header keeps the winning nonce. On `Exhausted` the
    /// header holds `u32::MAX`, which was tried and failed.
    pub fn run_burst<E>(&mut self, engine: &E, iterations: u32) -> BurstReport
    where
        E: HashEngine + ?Sized,
    {
        let mut attempts = 0u32;

        for _ in 0..iterations {
            let found = engine.verify_proof_of_work(&self.block.header);
            attempts += 1;
            self.attempts += 1;

            if found {
                return BurstReport {
                    outcome: BurstOutcome::Found,
                    attempts,
                };
            }

            match self.block.header.nonce.checked_add(1) {
                Some(next) => self.block.header.nonce = next,
                None => {
                    return BurstReport {
                        outcome: BurstOutcome::Exhausted,
                        attempts,
                    }
                }
            }
        }

        BurstReport {
            outcome: BurstOutcome::Continue,
            attempts,
        }
    }
}
