//! Settlement module: the transactional boundary for wager transitions.
//!
//! This module implements:
//! - Wager creation with escrow hold on the creator's stake
//! - Accepting a wager (opponent escrow + match creation) atomically
//! - Completing a wager (winner payout + platform fee + match finish)
//! - Cancelling with full escrow release/refund
//! - Read-side listings and betting history
//!
//! Every state-changing operation runs inside one database transaction over
//! the affected wager, match and account rows; concurrent losers of a race
//! observe the new state and fail with a typed error instead of corrupting
//! a balance.
//!
//! ## Example
//!
//! ```no_run
//! use cue_stakes::db::Database;
//! use cue_stakes::settlement::SettlementManager;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let settlement = SettlementManager::new(Arc::new(db.pool().clone()));
//!
//!     // Offer a R$ 25.00 head-to-head wager
//!     let wager = settlement.create_wager(2, 2_500).await?;
//!     let (wager, game) = settlement.accept_wager(wager.id, 3).await?;
//!     let game = settlement.start_match(game.id).await?;
//!     let (_game, settled) = settlement.report_match_result(game.id, 3).await?;
//!     println!("settled: {:?}", settled.map(|w| w.winner_id));
//!     # let _ = wager;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{SettlementError, SettlementResult};
pub use manager::SettlementManager;
pub use models::{BettingHistory, HistoryEntry, HistoryStats, WagerOutcome};
