//! Payment error types.

use crate::ledger::LedgerError;
use thiserror::Error;

/// Payment errors
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Amount outside the configured deposit/withdrawal bounds
    #[error("Invalid amount: {amount} (allowed {min}..={max})")]
    InvalidAmount { amount: i64, min: i64, max: i64 },

    /// Installments outside 1..=12
    #[error("Invalid installments: {0}")]
    InvalidInstallments(u32),

    /// Account not found
    #[error("Account not found: {0}")]
    AccountNotFound(i64),

    /// Withdrawal exceeds the available balance
    #[error("Insufficient funds: available {available}, required {required}")]
    InsufficientFunds { available: i64, required: i64 },

    /// The external gateway rejected or failed the request
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Ledger error
    #[error("Ledger error: {0}")]
    Ledger(LedgerError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl PaymentError {
    /// Get a client-safe error message that doesn't leak sensitive information
    pub fn client_message(&self) -> String {
        match self {
            PaymentError::Database(_) | PaymentError::Ledger(LedgerError::Database(_)) => {
                "Internal server error".to_string()
            }
            PaymentError::AccountNotFound(_) => "Account not found".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<LedgerError> for PaymentError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientFunds {
                available,
                required,
            } => PaymentError::InsufficientFunds {
                available,
                required,
            },
            LedgerError::AccountNotFound(id) => PaymentError::AccountNotFound(id),
            LedgerError::Database(db) => PaymentError::Database(db),
            other => PaymentError::Ledger(other),
        }
    }
}

/// Result type for payment operations
pub type PaymentResult<T> = Result<T, PaymentError>;
