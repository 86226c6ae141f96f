//! # Cue Stakes
//!
//! The escrow and ledger engine behind a head-to-head billiards wagering
//! platform. Two players put up equal stakes, the platform holds both in
//! escrow while the match is played, and settlement pays the pot minus a
//! fixed 5% fee to the winner — with a ledger that never lets money appear
//! or vanish.
//!
//! ## Architecture
//!
//! Leaves first:
//!
//! - [`ledger`]: append-only balance events over cached account balances;
//!   the only code that mutates a balance
//! - [`wager`]: the stake state machine (`open -> matched -> completed`,
//!   cancellable until completed) and fee arithmetic
//! - [`matches`]: the companion game state machine
//!   (`waiting -> playing -> finished`)
//! - [`settlement`]: the transactional coordinator applying every
//!   cross-entity transition atomically
//! - [`gateway`]: deposits/withdrawals behind an opaque payment-gateway
//!   seam, idempotent by external reference
//! - [`db`]: PostgreSQL pool and schema bootstrap
//!
//! All amounts are integer minor units (centavos); currency never touches
//! floating point.
//!
//! ## Example
//!
//! ```no_run
//! use cue_stakes::db::{Database, DatabaseConfig};
//! use cue_stakes::ledger::LedgerManager;
//! use cue_stakes::settlement::SettlementManager;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::from_env()).await?;
//!     db.ensure_schema().await?;
//!
//!     let pool = Arc::new(db.pool().clone());
//!     let ledger = LedgerManager::new(pool.clone());
//!     let settlement = SettlementManager::new(pool);
//!
//!     let creator = ledger.create_account().await?;
//!     let wager = settlement.create_wager(creator.id, 2_500).await?;
//!     println!("wager {} open, prize {}", wager.id, wager.total_prize);
//!     Ok(())
//! }
//! ```

/// PostgreSQL pool, configuration and schema bootstrap.
pub mod db;
pub use db::{Database, DatabaseConfig, PLATFORM_ACCOUNT_ID};

/// Append-only ledger and account balances.
pub mod ledger;
pub use ledger::{LedgerError, LedgerManager};

/// Wager state machine models and fee arithmetic.
pub mod wager;
pub use wager::{FeeBreakdown, WagerLimits, WagerStatus};

/// Match state machine models.
pub mod matches;
pub use matches::MatchStatus;

/// Transactional settlement coordinator.
pub mod settlement;
pub use settlement::{SettlementError, SettlementManager};

/// Payment gateway adapter.
pub mod gateway;
pub use gateway::{PaymentGateway, PaymentManager, SandboxGateway};
