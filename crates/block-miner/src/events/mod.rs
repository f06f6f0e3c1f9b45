//! Event schemas
//!
//! - [`inbound`]: notifications the miner subscribes to
//! - [`outbound`]: lifecycle events the miner publishes

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
