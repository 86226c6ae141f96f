//! Payment manager: deposits, withdrawals and idempotent result application.
//!
//! Bridges the external gateway to the ledger. Deposits credit the wallet
//! only when a terminal payment result arrives; withdrawals debit up front
//! and refund if the payout is rejected. Result application is keyed by the
//! intent's unique external reference, so delivering the same webhook twice
//! can never double-credit.

use super::{
    client::PaymentGateway,
    errors::{PaymentError, PaymentResult},
    models::{
        CardPaymentRequest, DepositReceipt, GatewayPayment, PaymentIntent, PaymentIntentKind,
        PaymentMethod, PaymentRequest, PaymentStatus, WebhookOutcome,
    },
};
use crate::ledger::{AccountId, EntryKind, EntryRefs, LedgerManager};
use crate::wager::ParseStatusError;
use log::{info, warn};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::sync::Arc;
use uuid::Uuid;

/// Configured bounds for deposits and withdrawals (minor units)
#[derive(Debug, Clone, Copy)]
pub struct PaymentLimits {
    pub min_deposit: i64,
    pub max_deposit: i64,
    pub min_withdrawal: i64,
}

impl PaymentLimits {
    /// Load bounds from `DEPOSIT_MIN` / `DEPOSIT_MAX` / `WITHDRAWAL_MIN`,
    /// defaulting to R$ 10.00, R$ 5,000.00 and R$ 20.00.
    pub fn from_env() -> Self {
        let parse = |key: &str, default: i64| {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };

        Self {
            min_deposit: parse("DEPOSIT_MIN", 1_000),
            max_deposit: parse("DEPOSIT_MAX", 500_000),
            min_withdrawal: parse("WITHDRAWAL_MIN", 2_000),
        }
    }
}

impl Default for PaymentLimits {
    fn default() -> Self {
        Self {
            min_deposit: 1_000,
            max_deposit: 500_000,
            min_withdrawal: 2_000,
        }
    }
}

/// Payment manager
#[derive(Clone)]
pub struct PaymentManager {
    pool: Arc<PgPool>,
    gateway: Arc<dyn PaymentGateway>,
    limits: PaymentLimits,
}

impl PaymentManager {
    /// Create a new payment manager with limits from the environment
    pub fn new(pool: Arc<PgPool>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self::with_limits(pool, gateway, PaymentLimits::from_env())
    }

    /// Create a payment manager with explicit limits
    pub fn with_limits(
        pool: Arc<PgPool>,
        gateway: Arc<dyn PaymentGateway>,
        limits: PaymentLimits,
    ) -> Self {
        Self {
            pool,
            gateway,
            limits,
        }
    }

    /// Configured deposit/withdrawal bounds
    pub fn limits(&self) -> PaymentLimits {
        self.limits
    }

    /// Start a PIX deposit: ask the gateway for a payment and track it as a
    /// pending intent. The wallet is credited only when the payment result
    /// arrives through [`PaymentManager::on_payment_result`].
    pub async fn create_pix_deposit(
        &self,
        account_id: AccountId,
        amount: i64,
    ) -> PaymentResult<DepositReceipt> {
        self.check_deposit_amount(amount)?;
        self.ensure_account(account_id).await?;

        let external_reference = new_reference("deposit", account_id);
        let payment = self
            .gateway
            .create_pix_payment(&PaymentRequest {
                amount,
                description: format!("Deposit for account {account_id}"),
                external_reference: external_reference.clone(),
            })
            .await?;

        let intent = self
            .insert_intent(
                account_id,
                PaymentIntentKind::Deposit,
                amount,
                PaymentMethod::Pix,
                &external_reference,
                Some(&payment.payment_id),
                None,
            )
            .await?;

        info!(
            "PIX deposit {} created for account {account_id} ({amount})",
            intent.external_reference
        );

        Ok(DepositReceipt { intent, payment })
    }

    /// Start a card deposit. Card payments the gateway approves synchronously
    /// are credited immediately through the same idempotent path the webhook
    /// uses.
    pub async fn create_card_deposit(
        &self,
        account_id: AccountId,
        amount: i64,
        card_token: String,
        installments: u32,
    ) -> PaymentResult<DepositReceipt> {
        self.check_deposit_amount(amount)?;
        if installments == 0 || installments > 12 {
            return Err(PaymentError::InvalidInstallments(installments));
        }
        self.ensure_account(account_id).await?;

        let external_reference = new_reference("deposit", account_id);
        let payment = self
            .gateway
            .create_card_payment(&CardPaymentRequest {
                amount,
                description: format!("Deposit for account {account_id}"),
                external_reference: external_reference.clone(),
                card_token,
                installments,
            })
            .await?;

        let mut intent = self
            .insert_intent(
                account_id,
                PaymentIntentKind::Deposit,
                amount,
                PaymentMethod::CreditCard,
                &external_reference,
                Some(&payment.payment_id),
                None,
            )
            .await?;

        if payment.status.is_terminal() {
            if let WebhookOutcome::Applied(updated) = self
                .on_payment_result(&external_reference, payment.status, payment.amount)
                .await?
            {
                intent = updated;
            }
        }

        Ok(DepositReceipt { intent, payment })
    }

    /// Request a withdrawal: debit the wallet immediately and hand the payout
    /// to the gateway's offline pipeline as a pending intent.
    ///
    /// The debit is atomic with its balance check, so two racing withdrawals
    /// cannot both pass on the same funds.
    pub async fn request_withdrawal(
        &self,
        account_id: AccountId,
        amount: i64,
        pix_key: String,
    ) -> PaymentResult<PaymentIntent> {
        if amount < self.limits.min_withdrawal {
            return Err(PaymentError::InvalidAmount {
                amount,
                min: self.limits.min_withdrawal,
                max: i64::MAX,
            });
        }

        let external_reference = new_reference("withdrawal", account_id);
        let mut tx = self.pool.begin().await?;

        LedgerManager::record(
            &mut tx,
            account_id,
            -amount,
            EntryKind::Withdrawal,
            EntryRefs::none(),
            &format!("withdrawal_{external_reference}"),
            Some("Withdrawal via PIX".to_string()),
        )
        .await?;

        let row = sqlx::query(
            r#"
            INSERT INTO payment_intents
                (account_id, kind, amount, status, method, external_reference, pix_key, description)
            VALUES ($1, 'withdrawal', $2, 'pending', 'pix', $3, $4, $5)
            RETURNING id, account_id, kind, amount, status, method, external_reference,
                      external_id, pix_key, description, created_at, updated_at
            "#,
        )
        .bind(account_id)
        .bind(amount)
        .bind(&external_reference)
        .bind(&pix_key)
        .bind("Withdrawal via PIX")
        .fetch_one(&mut *tx)
        .await?;

        let intent = intent_from_row(&row)?;
        tx.commit().await?;

        info!("Withdrawal {external_reference} requested by account {account_id} ({amount})");
        Ok(intent)
    }

    /// Apply an external payment result. Idempotent by external reference.
    ///
    /// The intent flip `pending -> terminal` and the resulting ledger credit
    /// happen in one transaction guarded by a conditional update, so a
    /// repeated notification finds no pending intent and is ignored.
    /// Non-terminal statuses and unknown references are acknowledged without
    /// effect.
    pub async fn on_payment_result(
        &self,
        external_reference: &str,
        status: PaymentStatus,
        amount: i64,
    ) -> PaymentResult<WebhookOutcome> {
        if !status.is_terminal() {
            return Ok(WebhookOutcome::Ignored);
        }

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE payment_intents
            SET status = $1, updated_at = NOW()
            WHERE external_reference = $2 AND status = 'pending'
            RETURNING id, account_id, kind, amount, status, method, external_reference,
                      external_id, pix_key, description, created_at, updated_at
            "#,
        )
        .bind(status.to_string())
        .bind(external_reference)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = updated else {
            let known = sqlx::query("SELECT id FROM payment_intents WHERE external_reference = $1")
                .bind(external_reference)
                .fetch_optional(&mut *tx)
                .await?;

            return if known.is_some() {
                info!("Payment result for {external_reference} already processed, ignoring");
                Ok(WebhookOutcome::AlreadyProcessed)
            } else {
                warn!("Payment result for unknown reference {external_reference}, ignoring");
                Ok(WebhookOutcome::Ignored)
            };
        };

        let intent = intent_from_row(&row)?;

        if amount != 0 && amount != intent.amount {
            warn!(
                "Payment {} reported amount {amount}, intent holds {}; applying the held amount",
                external_reference, intent.amount
            );
        }

        match (intent.kind, status) {
            (PaymentIntentKind::Deposit, PaymentStatus::Approved) => {
                LedgerManager::record(
                    &mut tx,
                    intent.account_id,
                    intent.amount,
                    EntryKind::Deposit,
                    EntryRefs::none(),
                    &format!("deposit_{external_reference}"),
                    Some("Deposit confirmed".to_string()),
                )
                .await?;
            }
            (PaymentIntentKind::Withdrawal, PaymentStatus::Rejected)
            | (PaymentIntentKind::Withdrawal, PaymentStatus::Cancelled) => {
                // The payout never left; put the held funds back
                LedgerManager::record(
                    &mut tx,
                    intent.account_id,
                    intent.amount,
                    EntryKind::EscrowRelease,
                    EntryRefs::none(),
                    &format!("withdrawal_refund_{external_reference}"),
                    Some("Withdrawal returned".to_string()),
                )
                .await?;
            }
            // Declined deposits and completed payouts move no money
            _ => {}
        }

        tx.commit().await?;

        info!("Payment result for {external_reference} applied: {status}");
        Ok(WebhookOutcome::Applied(intent))
    }

    /// Poll the gateway for a payment and apply its current state.
    ///
    /// Covers gateways whose webhooks were missed; safe to call repeatedly.
    pub async fn sync_payment(&self, payment_id: &str) -> PaymentResult<WebhookOutcome> {
        let payment = self.gateway.get_payment(payment_id).await?;

        match payment.external_reference {
            Some(reference) => {
                self.on_payment_result(&reference, payment.status, payment.amount)
                    .await
            }
            None => {
                // Fall back to our own record of the reference
                let row = sqlx::query(
                    "SELECT external_reference FROM payment_intents WHERE external_id = $1",
                )
                .bind(payment_id)
                .fetch_optional(self.pool.as_ref())
                .await?;

                match row {
                    Some(row) => {
                        let reference: String = row.get("external_reference");
                        self.on_payment_result(&reference, payment.status, payment.amount)
                            .await
                    }
                    None => Ok(WebhookOutcome::Ignored),
                }
            }
        }
    }

    /// Find an intent by its external reference
    pub async fn find_by_reference(&self, external_reference: &str) -> PaymentResult<Option<PaymentIntent>> {
        let row = sqlx::query(
            "SELECT id, account_id, kind, amount, status, method, external_reference,
                    external_id, pix_key, description, created_at, updated_at
             FROM payment_intents WHERE external_reference = $1",
        )
        .bind(external_reference)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(|r| intent_from_row(&r)).transpose()
    }

    /// Payment intents for an account, newest first
    pub async fn intents_for_account(
        &self,
        account_id: AccountId,
        limit: i64,
    ) -> PaymentResult<Vec<PaymentIntent>> {
        let rows = sqlx::query(
            "SELECT id, account_id, kind, amount, status, method, external_reference,
                    external_id, pix_key, description, created_at, updated_at
             FROM payment_intents
             WHERE account_id = $1
             ORDER BY created_at DESC
             LIMIT $2",
        )
        .bind(account_id)
        .bind(limit.clamp(1, 50))
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter().map(intent_from_row).collect()
    }

    fn check_deposit_amount(&self, amount: i64) -> PaymentResult<()> {
        if amount < self.limits.min_deposit || amount > self.limits.max_deposit {
            return Err(PaymentError::InvalidAmount {
                amount,
                min: self.limits.min_deposit,
                max: self.limits.max_deposit,
            });
        }
        Ok(())
    }

    async fn ensure_account(&self, account_id: AccountId) -> PaymentResult<()> {
        sqlx::query("SELECT id FROM accounts WHERE id = $1")
            .bind(account_id)
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or(PaymentError::AccountNotFound(account_id))?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_intent(
        &self,
        account_id: AccountId,
        kind: PaymentIntentKind,
        amount: i64,
        method: PaymentMethod,
        external_reference: &str,
        external_id: Option<&str>,
        pix_key: Option<&str>,
    ) -> PaymentResult<PaymentIntent> {
        let row = sqlx::query(
            r#"
            INSERT INTO payment_intents
                (account_id, kind, amount, status, method, external_reference, external_id, pix_key)
            VALUES ($1, $2, $3, 'pending', $4, $5, $6, $7)
            RETURNING id, account_id, kind, amount, status, method, external_reference,
                      external_id, pix_key, description, created_at, updated_at
            "#,
        )
        .bind(account_id)
        .bind(kind.to_string())
        .bind(amount)
        .bind(method.to_string())
        .bind(external_reference)
        .bind(external_id)
        .bind(pix_key)
        .fetch_one(self.pool.as_ref())
        .await?;

        intent_from_row(&row)
    }
}

/// Fresh external reference: kind, account, random suffix.
fn new_reference(kind: &str, account_id: AccountId) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{kind}_{account_id}_{}", &suffix[..8])
}

fn intent_from_row(row: &PgRow) -> PaymentResult<PaymentIntent> {
    let parse_err = |e: ParseStatusError| PaymentError::Database(sqlx::Error::Decode(Box::new(e)));

    Ok(PaymentIntent {
        id: row.get("id"),
        account_id: row.get("account_id"),
        kind: row.get::<String, _>("kind").parse().map_err(parse_err)?,
        amount: row.get("amount"),
        status: row.get::<String, _>("status").parse().map_err(parse_err)?,
        method: row.get::<String, _>("method").parse().map_err(parse_err)?,
        external_reference: row.get("external_reference"),
        external_id: row.get("external_id"),
        pix_key: row.get("pix_key"),
        description: row.get("description"),
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
        updated_at: row.get::<chrono::NaiveDateTime, _>("updated_at").and_utc(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_format() {
        let reference = new_reference("deposit", 42);
        assert!(reference.starts_with("deposit_42_"));
        assert_eq!(reference.len(), "deposit_42_".len() + 8);
    }

    #[test]
    fn test_limits_defaults() {
        let limits = PaymentLimits::default();
        assert_eq!(limits.min_deposit, 1_000);
        assert_eq!(limits.max_deposit, 500_000);
        assert_eq!(limits.min_withdrawal, 2_000);
    }
}
