//! Ledger data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account ID type
pub type AccountId = i64;

/// Account model (one balance per user, platform-owned)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub balance: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ledger entry model (append-only, source of truth for balances)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub account_id: AccountId,
    pub amount: i64,
    pub balance_after: i64,
    pub direction: EntryDirection,
    pub kind: EntryKind,
    pub wager_id: Option<i64>,
    pub match_id: Option<i64>,
    pub idempotency_key: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Entry direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryDirection {
    Debit,
    Credit,
}

impl std::fmt::Display for EntryDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryDirection::Debit => write!(f, "debit"),
            EntryDirection::Credit => write!(f, "credit"),
        }
    }
}

/// Balance-affecting event kinds.
///
/// Debit-class kinds remove funds and are rejected when the balance would
/// go negative; credit-class kinds add funds and are exempt from that check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Deposit,
    Withdrawal,
    EscrowHold,
    EscrowRelease,
    BetWin,
    BetRefund,
    PlatformFee,
}

impl EntryKind {
    /// Whether this kind removes funds from the account.
    pub fn is_debit(self) -> bool {
        matches!(self, EntryKind::Withdrawal | EntryKind::EscrowHold)
    }

    /// Direction implied by the kind.
    pub fn direction(self) -> EntryDirection {
        if self.is_debit() {
            EntryDirection::Debit
        } else {
            EntryDirection::Credit
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Deposit => write!(f, "deposit"),
            EntryKind::Withdrawal => write!(f, "withdrawal"),
            EntryKind::EscrowHold => write!(f, "escrow_hold"),
            EntryKind::EscrowRelease => write!(f, "escrow_release"),
            EntryKind::BetWin => write!(f, "bet_win"),
            EntryKind::BetRefund => write!(f, "bet_refund"),
            EntryKind::PlatformFee => write!(f, "platform_fee"),
        }
    }
}

impl std::str::FromStr for EntryKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(EntryKind::Deposit),
            "withdrawal" => Ok(EntryKind::Withdrawal),
            "escrow_hold" => Ok(EntryKind::EscrowHold),
            "escrow_release" => Ok(EntryKind::EscrowRelease),
            "bet_win" => Ok(EntryKind::BetWin),
            "bet_refund" => Ok(EntryKind::BetRefund),
            "platform_fee" => Ok(EntryKind::PlatformFee),
            other => Err(ParseKindError(other.to_string())),
        }
    }
}

/// Unknown ledger entry kind in a stored row
#[derive(Debug, thiserror::Error)]
#[error("Unknown ledger entry kind: {0}")]
pub struct ParseKindError(pub String);

/// Audit references attaching an entry to the wager/match that caused it.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryRefs {
    pub wager_id: Option<i64>,
    pub match_id: Option<i64>,
}

impl EntryRefs {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn wager(wager_id: i64) -> Self {
        Self {
            wager_id: Some(wager_id),
            match_id: None,
        }
    }

    pub fn wager_and_match(wager_id: i64, match_id: i64) -> Self {
        Self {
            wager_id: Some(wager_id),
            match_id: Some(match_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_direction_split() {
        assert!(EntryKind::Withdrawal.is_debit());
        assert!(EntryKind::EscrowHold.is_debit());
        assert!(!EntryKind::Deposit.is_debit());
        assert!(!EntryKind::EscrowRelease.is_debit());
        assert!(!EntryKind::BetWin.is_debit());
        assert!(!EntryKind::BetRefund.is_debit());
        assert!(!EntryKind::PlatformFee.is_debit());
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            EntryKind::Deposit,
            EntryKind::Withdrawal,
            EntryKind::EscrowHold,
            EntryKind::EscrowRelease,
            EntryKind::BetWin,
            EntryKind::BetRefund,
            EntryKind::PlatformFee,
        ] {
            let parsed: EntryKind = kind.to_string().parse().expect("known kind");
            assert_eq!(parsed, kind);
        }
        assert!("rake".parse::<EntryKind>().is_err());
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(EntryDirection::Debit.to_string(), "debit");
        assert_eq!(EntryDirection::Credit.to_string(), "credit");
    }

    #[test]
    fn test_wire_shape_matches_stored_strings() {
        // The JSON representation must match what the database stores
        let kind = serde_json::to_value(EntryKind::EscrowHold).unwrap();
        assert_eq!(kind, "escrow_hold");
        let direction = serde_json::to_value(EntryDirection::Debit).unwrap();
        assert_eq!(direction, "debit");
    }
}
