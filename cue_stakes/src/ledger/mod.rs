//! Ledger module providing account balances backed by an append-only entry log.
//!
//! This module implements:
//! - Append-only ledger entries for every balance-affecting event
//! - Cached per-account balances kept equal to the fold of entries
//! - Atomic check-and-debit (no read-then-write races)
//! - Idempotency keys to prevent duplicate application
//! - Historical balance reconstruction by replay
//!
//! ## Example
//!
//! ```no_run
//! use cue_stakes::db::Database;
//! use cue_stakes::ledger::LedgerManager;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let ledger = LedgerManager::new(Arc::new(db.pool().clone()));
//!
//!     let account = ledger.create_account().await?;
//!     println!("Account {} opened with {}", account.id, account.balance);
//!
//!     let replayed = ledger.replayed_balance(account.id, None).await?;
//!     assert_eq!(replayed, account.balance);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{LedgerError, LedgerResult};
pub use manager::LedgerManager;
pub use models::{
    Account, AccountId, EntryDirection, EntryKind, EntryRefs, LedgerEntry, ParseKindError,
};
