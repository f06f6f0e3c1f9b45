//! Outbound events (published)
//!
//! Notifications for observers (UI, logging, automation). Nothing the
//! miner publishes feeds back into its own control flow.

use crate::domain::{Address, Block};
use serde::{Deserialize, Serialize};
use shared_bus::BusEvent;
use uuid::Uuid;

/// Miner lifecycle event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MinerEvent {
    /// Miner entered `Working`
    Started {
        /// Payout address in use
        address: Address,
    },

    /// Miner returned to `Idle`
    Stopped,

    /// A block satisfying its target was found (emitted before submission)
    BlockMined(Block),

    /// New hashrate sample in H/s
    HashrateChanged(f64),

    /// A session ended on a fault
    Error(MinerErrorEvent),
}

/// Error details carried by [`MinerEvent::Error`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinerErrorEvent {
    /// Category
    pub kind: MinerErrorKind,

    /// Human readable description
    pub message: String,

    /// Session the fault belongs to
    pub session_id: Option<Uuid>,
}

/// Error event categories
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MinerErrorKind {
    /// Chain refused or could not take a mined block
    Submission,

    /// Session ran out of nonces; a fresh candidate follows
    NonceExhausted,

    /// Chain oracle failed while a session was checking the tip
    ChainFault,

    /// Hash engine panicked during a burst
    EngineFault,
}

/// Miner event topics
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MinerTopic {
    /// `Started` and `Stopped`
    Lifecycle,
    /// `BlockMined`
    BlockMined,
    /// `HashrateChanged`
    Hashrate,
    /// `Error`
    Error,
}

impl BusEvent for MinerEvent {
    type Topic = MinerTopic;

    fn topic(&self) -> MinerTopic {
        match self {
            Self::Started { .. } | Self::Stopped => MinerTopic::Lifecycle,
            Self::BlockMined(_) => MinerTopic::BlockMined,
            Self::HashrateChanged(_) => MinerTopic::Hashrate,
            Self::Error(_) => MinerTopic::Error,
        }
    }
}
