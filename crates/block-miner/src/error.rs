//! Error types for the miner

use thiserror::Error;

/// Result type alias for miner operations
pub type Result<T> = std::result::Result<T, MinerError>;

/// Errors that can occur while assembling, mining or submitting blocks
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MinerError {
    /// Chain oracle could not supply current data
    #[error("Chain unavailable: {0}")]
    ChainUnavailable(String),

    /// Transaction source could not supply a snapshot
    #[error("Mempool unavailable: {0}")]
    MempoolUnavailable(String),

    /// Chain refused or could not take a mined block
    #[error("Block submission rejected: {0}")]
    SubmissionRejected(String),

    /// Every nonce from the seed up to the top of the nonce field was tried
    #[error("Nonce space exhausted after {attempts} attempts from seed {seed}")]
    NonceSpaceExhausted {
        /// Seed nonce the session started from
        seed: u32,
        /// Attempts made by the session
        attempts: u64,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MinerError {
    /// Check if error is transient (the next trigger may succeed)
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ChainUnavailable(_) | Self::MempoolUnavailable(_) | Self::NonceSpaceExhausted { .. }
        )
    }

    /// Check if error is critical (miner cannot operate)
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::InvalidConfig(_) | Self::Internal(_))
    }
}
