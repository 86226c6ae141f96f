//! Gateway module: the adapter between external payments and the ledger.
//!
//! This module implements:
//! - The [`PaymentGateway`] request/response seam (the HTTP integration
//!   itself lives outside the core)
//! - Deposit/withdrawal intents correlated by unique external reference
//! - Idempotent application of payment results: a webhook delivered twice
//!   credits exactly once
//! - An offline [`SandboxGateway`] for development and tests
//!
//! ## Example
//!
//! ```no_run
//! use cue_stakes::db::Database;
//! use cue_stakes::gateway::{PaymentManager, PaymentStatus, SandboxGateway};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let pool = Arc::new(db.pool().clone());
//!     let payments = PaymentManager::new(pool, Arc::new(SandboxGateway::new()));
//!
//!     let receipt = payments.create_pix_deposit(2, 10_000).await?;
//!     // ... payer completes the PIX transfer, the gateway notifies us:
//!     payments
//!         .on_payment_result(&receipt.intent.external_reference, PaymentStatus::Approved, 10_000)
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod errors;
pub mod manager;
pub mod models;
pub mod sandbox;

pub use client::PaymentGateway;
pub use errors::{PaymentError, PaymentResult};
pub use manager::{PaymentLimits, PaymentManager};
pub use models::{
    CardPaymentRequest, DepositReceipt, GatewayPayment, PaymentIntent, PaymentIntentId,
    PaymentIntentKind, PaymentMethod, PaymentRequest, PaymentStatus, WebhookOutcome,
};
pub use sandbox::SandboxGateway;
