//! Inbound events (subscribed)

use primitive_types::H256;
use serde::{Deserialize, Serialize};
use shared_bus::BusEvent;

/// Event from the chain: the accepted tip moved
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainEvent {
    /// New head block
    HeadChanged {
        /// Hash of the new tip
        hash: H256,
    },
}

/// Chain event topics
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainTopic {
    /// Head changes
    Head,
}

impl BusEvent for ChainEvent {
    type Topic = ChainTopic;

    fn topic(&self) -> ChainTopic {
        match self {
            Self::HeadChanged { .. } => ChainTopic::Head,
        }
    }
}

/// Event from the mempool
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MempoolEvent {
    /// Selection is ready, e.g. after eviction following a head change
    TransactionsReady,

    /// A new transaction was admitted
    TransactionAdded {
        /// Transaction hash
        hash: H256,
    },
}

/// Mempool event topics
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MempoolTopic {
    /// `TransactionsReady`
    Ready,
    /// `TransactionAdded`
    Added,
}

impl BusEvent for MempoolEvent {
    type Topic = MempoolTopic;

    fn topic(&self) -> MempoolTopic {
        match self {
            Self::TransactionsReady => MempoolTopic::Ready,
            Self::TransactionAdded { .. } => MempoolTopic::Added,
        }
    }
}
