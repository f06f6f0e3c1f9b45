//! Domain entities for the miner

use crate::utils::hashing::{bytes_to_h256, serialize_block_header, sha256, sha256d};
use primitive_types::{H256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payout destination for mined blocks
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Placeholder used when no address was configured
    pub const fn zero() -> Self {
        Self([0u8; 20])
    }

    /// Whether this is the placeholder address
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Transaction as handed over by the transaction source
///
/// The miner never inspects the payload; it only hashes it into the body
/// digest and carries it in the order supplied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Encoded transaction
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,
}

impl Transaction {
    /// Wrap an encoded transaction
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// SHA-256 of the payload
    pub fn hash(&self) -> H256 {
        bytes_to_h256(&sha256(&self.payload))
    }
}

/// Block header
///
/// Every field except `nonce` is fixed once the candidate is assembled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Hash of the chain tip this block extends
    pub prev_hash: H256,

    /// Digest of the block body
    pub body_hash: H256,

    /// Accounts-state digest at the parent
    pub accounts_hash: H256,

    /// PoW target; the PoW hash must be numerically below it (higher = easier)
    pub difficulty: U256,

    /// Unix timestamp (seconds)
    pub timestamp: u64,

    /// Nonce varied during the search
    pub nonce: u32,
}

impl BlockHeader {
    /// Canonical byte encoding used for hashing
    pub fn serialize(&self) -> Vec<u8> {
        serialize_block_header(
            &self.prev_hash,
            &self.body_hash,
            &self.accounts_hash,
            self.difficulty,
            self.timestamp,
            self.nonce,
        )
    }

    /// Block identity hash (SHA-256d of the canonical encoding)
    ///
    /// Independent of the PoW engine in use.
    pub fn hash(&self) -> H256 {
        bytes_to_h256(&sha256d(&self.serialize()))
    }
}

/// Block body
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockBody {
    /// Payout address
    pub miner: Address,

    /// Selected transactions, in mempool order
    pub transactions: Vec<Transaction>,
}

impl BlockBody {
    /// Create a body
    pub fn new(miner: Address, transactions: Vec<Transaction>) -> Self {
        Self {
            miner,
            transactions,
        }
    }

    /// Body digest: SHA-256 over the miner address and each transaction hash
    pub fn hash(&self) -> H256 {
        let mut bytes = Vec::with_capacity(20 + 32 * self.transactions.len());
        bytes.extend_from_slice(self.miner.as_bytes());
        for tx in &self.transactions {
            bytes.extend_from_slice(tx.hash().as_bytes());
        }
        bytes_to_h256(&sha256(&bytes))
    }

    /// Number of transactions
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }
}

/// Candidate or mined block
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Header
    pub header: BlockHeader,

    /// Body
    pub body: BlockBody,
}

impl Block {
    /// Block identity hash
    pub fn hash(&self) -> H256 {
        self.header.hash()
    }

    /// Parent hash
    pub fn prev_hash(&self) -> H256 {
        self.header.prev_hash
    }

    /// Current nonce
    pub fn nonce(&self) -> u32 {
        self.header.nonce
    }

    /// Number of transactions in the body
    pub fn transaction_count(&self) -> usize {
        self.body.transaction_count()
    }
}

/// Miner lifecycle state
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MinerState {
    /// Not mining; no subscriptions, no sampler
    Idle,

    /// Mining; at most one search session active
    Working,
}
