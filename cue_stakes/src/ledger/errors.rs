//! Ledger error types.

use thiserror::Error;

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Insufficient funds for a debit-class entry
    #[error("Insufficient funds: available {available}, required {required}")]
    InsufficientFunds { available: i64, required: i64 },

    /// Account not found
    #[error("Account not found: {0}")]
    AccountNotFound(i64),

    /// Idempotency key already used
    #[error("Duplicate ledger entry: {0}")]
    DuplicateEntry(String),

    /// Amount is zero, negative where a positive is required, or has the
    /// wrong sign for the entry kind
    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),

    /// Crediting would overflow the account balance
    #[error("Balance overflow")]
    BalanceOverflow,
}

impl LedgerError {
    /// Get a client-safe error message that doesn't leak sensitive information
    pub fn client_message(&self) -> String {
        match self {
            // Sanitize database errors - don't expose SQL details
            LedgerError::Database(_) => "Internal server error".to_string(),
            // Sanitize account not found - don't expose account IDs
            LedgerError::AccountNotFound(_) => "Account not found".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
