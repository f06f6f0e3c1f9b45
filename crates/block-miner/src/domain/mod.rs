//! Domain layer - Pure logic for block mining
//!
//! No I/O and no async here: entities, and the nonce search session that
//! the service layer drives burst by burst.
//!
//! ## Entities
//!
//! - [`Block`], [`BlockHeader`], [`BlockBody`]: candidate and mined blocks
//! - [`Address`]: payout destination
//! - [`Transaction`]: opaque mempool payload
//!
//! ## Services
//!
//! - [`SearchSession`]: bounded-burst nonce search over one candidate

mod entities;
pub mod session;

pub use entities::*;
pub use session::{BurstOutcome, BurstReport, SearchSession};
