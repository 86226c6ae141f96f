//! Settlement error types.

use crate::ledger::LedgerError;
use crate::matches::MatchId;
use crate::wager::WagerId;
use thiserror::Error;

/// Settlement errors
#[derive(Debug, Error)]
pub enum SettlementError {
    /// Stake outside the configured bounds
    #[error("Invalid amount: {amount} (allowed {min}..={max})")]
    InvalidAmount { amount: i64, min: i64, max: i64 },

    /// Participant cannot cover the stake
    #[error("Insufficient funds: available {available}, required {required}")]
    InsufficientFunds { available: i64, required: i64 },

    /// Operation attempted at the wrong lifecycle stage
    #[error("Invalid state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },

    /// Reported winner is not a participant
    #[error("Invalid winner: account {0} is not a participant")]
    InvalidWinner(i64),

    /// Creator tried to accept their own wager
    #[error("Cannot accept your own wager")]
    SelfMatch,

    /// Wager not found
    #[error("Wager not found: {0}")]
    WagerNotFound(WagerId),

    /// Match not found
    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    /// Account not found
    #[error("Account not found: {0}")]
    AccountNotFound(i64),

    /// Lost a race for a shared entity; re-read and retry
    #[error("Concurrent update conflict, retry the operation")]
    ConcurrencyConflict,

    /// Ledger error
    #[error("Ledger error: {0}")]
    Ledger(LedgerError),

    /// Database error
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl SettlementError {
    /// Whether the caller may retry the same operation after re-reading.
    pub fn is_retriable(&self) -> bool {
        matches!(self, SettlementError::ConcurrencyConflict)
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    pub fn client_message(&self) -> String {
        match self {
            SettlementError::Database(_) | SettlementError::Ledger(LedgerError::Database(_)) => {
                "Internal server error".to_string()
            }
            SettlementError::WagerNotFound(_) => "Wager not found".to_string(),
            SettlementError::MatchNotFound(_) => "Match not found".to_string(),
            SettlementError::AccountNotFound(_) => "Account not found".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<sqlx::Error> for SettlementError {
    fn from(e: sqlx::Error) -> Self {
        // Serialization failures and deadlocks are retriable races, not faults
        if let sqlx::Error::Database(db) = &e {
            if let Some(code) = db.code() {
                if code == "40001" || code == "40P01" {
                    return SettlementError::ConcurrencyConflict;
                }
            }
        }
        SettlementError::Database(e)
    }
}

impl From<LedgerError> for SettlementError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientFunds {
                available,
                required,
            } => SettlementError::InsufficientFunds {
                available,
                required,
            },
            LedgerError::AccountNotFound(id) => SettlementError::AccountNotFound(id),
            LedgerError::Database(db) => SettlementError::from(db),
            other => SettlementError::Ledger(other),
        }
    }
}

/// Result type for settlement operations
pub type SettlementResult<T> = Result<T, SettlementError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_conflict_is_retriable() {
        assert!(SettlementError::ConcurrencyConflict.is_retriable());
        assert!(!SettlementError::SelfMatch.is_retriable());
        assert!(
            !SettlementError::InvalidWinner(3).is_retriable(),
            "terminal errors must not be retried"
        );
    }

    #[test]
    fn test_ledger_error_mapping() {
        let mapped = SettlementError::from(LedgerError::InsufficientFunds {
            available: 2_499,
            required: 2_500,
        });
        assert!(matches!(
            mapped,
            SettlementError::InsufficientFunds {
                available: 2_499,
                required: 2_500,
            }
        ));

        let mapped = SettlementError::from(LedgerError::AccountNotFound(42));
        assert!(matches!(mapped, SettlementError::AccountNotFound(42)));
    }

    #[test]
    fn test_client_message_sanitizes_ids() {
        let msg = SettlementError::WagerNotFound(1234).client_message();
        assert!(!msg.contains("1234"));
    }
}
