//! Payment gateway data models.

use crate::ledger::AccountId;
use crate::wager::ParseStatusError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payment intent ID type
pub type PaymentIntentId = i64;

/// Direction of the money movement an intent tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentIntentKind {
    Deposit,
    Withdrawal,
}

impl std::fmt::Display for PaymentIntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentIntentKind::Deposit => write!(f, "deposit"),
            PaymentIntentKind::Withdrawal => write!(f, "withdrawal"),
        }
    }
}

impl std::str::FromStr for PaymentIntentKind {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(PaymentIntentKind::Deposit),
            "withdrawal" => Ok(PaymentIntentKind::Withdrawal),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Payment status, shared between stored intents and gateway results.
///
/// Gateways report a few in-flight states ("in_process", "authorized");
/// all of them parse to `Pending` because the core only acts on terminal
/// results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[serde(alias = "in_process", alias = "authorized")]
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl PaymentStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Approved => write!(f, "approved"),
            PaymentStatus::Rejected => write!(f, "rejected"),
            PaymentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" | "in_process" | "authorized" => Ok(PaymentStatus::Pending),
            "approved" => Ok(PaymentStatus::Approved),
            "rejected" => Ok(PaymentStatus::Rejected),
            "cancelled" => Ok(PaymentStatus::Cancelled),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Pix,
    CreditCard,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Pix => write!(f, "pix"),
            PaymentMethod::CreditCard => write!(f, "credit_card"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pix" => Ok(PaymentMethod::Pix),
            "credit_card" => Ok(PaymentMethod::CreditCard),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// A tracked deposit or withdrawal correlated with the external gateway.
///
/// The unique `external_reference` is the idempotency key: a payment result
/// only applies while the intent is still `pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: PaymentIntentId,
    pub account_id: AccountId,
    pub kind: PaymentIntentKind,
    pub amount: i64,
    pub status: PaymentStatus,
    pub method: PaymentMethod,
    pub external_reference: String,
    pub external_id: Option<String>,
    pub pix_key: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request for a new gateway payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount: i64,
    pub description: String,
    pub external_reference: String,
}

/// Request for a new card payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardPaymentRequest {
    pub amount: i64,
    pub description: String,
    pub external_reference: String,
    pub card_token: String,
    pub installments: u32,
}

/// Gateway-side view of a payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayment {
    pub payment_id: String,
    pub status: PaymentStatus,
    pub amount: i64,
    pub external_reference: Option<String>,
    pub qr_code: Option<String>,
    pub qr_code_base64: Option<String>,
    pub ticket_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// What creating a deposit produced: the stored intent plus whatever the
/// gateway handed back for the payer (QR code, ticket URL).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositReceipt {
    pub intent: PaymentIntent,
    pub payment: GatewayPayment,
}

/// Result of applying an external payment notification
#[derive(Debug, Clone)]
pub enum WebhookOutcome {
    /// The intent moved out of `pending` and any credit was applied
    Applied(PaymentIntent),
    /// The reference was already processed; nothing changed
    AlreadyProcessed,
    /// Unknown reference or non-terminal status; nothing changed
    Ignored,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_aliases() {
        assert_eq!("in_process".parse::<PaymentStatus>().unwrap(), PaymentStatus::Pending);
        assert_eq!("authorized".parse::<PaymentStatus>().unwrap(), PaymentStatus::Pending);
        assert_eq!("approved".parse::<PaymentStatus>().unwrap(), PaymentStatus::Approved);
        assert!("chargeback".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(PaymentStatus::Approved.is_terminal());
        assert!(PaymentStatus::Rejected.is_terminal());
        assert!(PaymentStatus::Cancelled.is_terminal());
    }
}
