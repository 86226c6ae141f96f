//! Ledger manager implementation: append-only entries over cached balances.
//!
//! Every balance mutation in the platform funnels through [`LedgerManager::record`].
//! The cached `accounts.balance` column is a projection of the entry log and
//! can be rebuilt at any point with [`LedgerManager::replayed_balance`].

use super::{
    errors::{LedgerError, LedgerResult},
    models::{Account, AccountId, EntryKind, EntryRefs, LedgerEntry, ParseKindError},
};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use std::sync::Arc;

/// Ledger manager
#[derive(Clone)]
pub struct LedgerManager {
    pool: Arc<PgPool>,
    opening_balance: i64,
}

impl LedgerManager {
    /// Create a new ledger manager
    ///
    /// Reads `OPENING_BALANCE` (minor units) from the environment for the
    /// welcome bonus credited to new accounts; defaults to R$ 50.00.
    pub fn new(pool: Arc<PgPool>) -> Self {
        let opening_balance = std::env::var("OPENING_BALANCE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5_000);

        Self {
            pool,
            opening_balance,
        }
    }

    /// Append a ledger entry and move the cached balance inside the caller's
    /// transaction.
    ///
    /// This is the only operation in the codebase that mutates
    /// `accounts.balance`. Debit-class kinds carry a negative `amount` and
    /// fail with [`LedgerError::InsufficientFunds`] when the balance would go
    /// negative; the check and the debit are a single conditional UPDATE, so
    /// no concurrent operation can observe or exploit a gap between them.
    ///
    /// # Arguments
    ///
    /// * `tx` - Open transaction the entry joins
    /// * `account_id` - Account being credited or debited
    /// * `amount` - Signed amount in minor units (negative for debits)
    /// * `kind` - Balance event kind; its direction must agree with the sign
    /// * `refs` - Optional wager/match references for audit traceability
    /// * `idempotency_key` - Unique key preventing duplicate application
    /// * `description` - Optional human-readable note
    ///
    /// # Errors
    ///
    /// * `LedgerError::InvalidAmount` - Zero amount or sign/kind mismatch
    /// * `LedgerError::DuplicateEntry` - Idempotency key already used
    /// * `LedgerError::InsufficientFunds` - Debit would overdraw the account
    /// * `LedgerError::BalanceOverflow` - Credit would overflow i64
    #[allow(clippy::too_many_arguments)]
    pub async fn record(
        tx: &mut Transaction<'_, Postgres>,
        account_id: AccountId,
        amount: i64,
        kind: EntryKind,
        refs: EntryRefs,
        idempotency_key: &str,
        description: Option<String>,
    ) -> LedgerResult<LedgerEntry> {
        if amount == 0 || kind.is_debit() != (amount < 0) {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let existing = sqlx::query("SELECT id FROM ledger_entries WHERE idempotency_key = $1")
            .bind(idempotency_key)
            .fetch_optional(&mut **tx)
            .await?;

        if existing.is_some() {
            return Err(LedgerError::DuplicateEntry(idempotency_key.to_string()));
        }

        let balance_after = if amount < 0 {
            Self::apply_debit(tx, account_id, amount).await?
        } else {
            Self::apply_credit(tx, account_id, amount).await?
        };

        let row = sqlx::query(
            r#"
            INSERT INTO ledger_entries
                (account_id, amount, balance_after, direction, kind, wager_id, match_id, idempotency_key, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, created_at
            "#,
        )
        .bind(account_id)
        .bind(amount)
        .bind(balance_after)
        .bind(kind.direction().to_string())
        .bind(kind.to_string())
        .bind(refs.wager_id)
        .bind(refs.match_id)
        .bind(idempotency_key)
        .bind(&description)
        .fetch_one(&mut **tx)
        .await?;

        Ok(LedgerEntry {
            id: row.get("id"),
            account_id,
            amount,
            balance_after,
            direction: kind.direction(),
            kind,
            wager_id: refs.wager_id,
            match_id: refs.match_id,
            idempotency_key: idempotency_key.to_string(),
            description,
            created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
        })
    }

    /// Atomically debit with balance check in a single statement.
    async fn apply_debit(
        tx: &mut Transaction<'_, Postgres>,
        account_id: AccountId,
        amount: i64,
    ) -> LedgerResult<i64> {
        let updated = sqlx::query(
            "UPDATE accounts
             SET balance = balance + $1, updated_at = NOW()
             WHERE id = $2 AND balance + $1 >= 0
             RETURNING balance",
        )
        .bind(amount)
        .bind(account_id)
        .fetch_optional(&mut **tx)
        .await?;

        match updated {
            Some(row) => Ok(row.get("balance")),
            None => {
                // Either the account doesn't exist or the balance is short
                let check = sqlx::query("SELECT balance FROM accounts WHERE id = $1")
                    .bind(account_id)
                    .fetch_optional(&mut **tx)
                    .await?;

                match check {
                    Some(row) => Err(LedgerError::InsufficientFunds {
                        available: row.get("balance"),
                        required: -amount,
                    }),
                    None => Err(LedgerError::AccountNotFound(account_id)),
                }
            }
        }
    }

    /// Credit under a row lock with overflow protection.
    async fn apply_credit(
        tx: &mut Transaction<'_, Postgres>,
        account_id: AccountId,
        amount: i64,
    ) -> LedgerResult<i64> {
        let current = sqlx::query("SELECT balance FROM accounts WHERE id = $1 FOR UPDATE")
            .bind(account_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(LedgerError::AccountNotFound(account_id))?;

        let current_balance: i64 = current.get("balance");
        let new_balance = current_balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow)?;

        sqlx::query("UPDATE accounts SET balance = $1, updated_at = NOW() WHERE id = $2")
            .bind(new_balance)
            .bind(account_id)
            .execute(&mut **tx)
            .await?;

        Ok(new_balance)
    }

    /// Credit an account in its own transaction.
    ///
    /// Thin wrapper over [`LedgerManager::record`] for callers outside a
    /// settlement transaction. `amount` is positive.
    pub async fn credit(
        &self,
        account_id: AccountId,
        amount: i64,
        kind: EntryKind,
        idempotency_key: &str,
        description: Option<String>,
    ) -> LedgerResult<LedgerEntry> {
        let mut tx = self.pool.begin().await?;
        let entry = Self::record(
            &mut tx,
            account_id,
            amount,
            kind,
            EntryRefs::none(),
            idempotency_key,
            description,
        )
        .await?;
        tx.commit().await?;
        Ok(entry)
    }

    /// Debit an account in its own transaction.
    ///
    /// Thin wrapper over [`LedgerManager::record`]; `amount` is positive and
    /// is negated for the entry. Fails with `InsufficientFunds` when the
    /// balance cannot cover it.
    pub async fn debit(
        &self,
        account_id: AccountId,
        amount: i64,
        kind: EntryKind,
        idempotency_key: &str,
        description: Option<String>,
    ) -> LedgerResult<LedgerEntry> {
        let mut tx = self.pool.begin().await?;
        let entry = Self::record(
            &mut tx,
            account_id,
            -amount,
            kind,
            EntryRefs::none(),
            idempotency_key,
            description,
        )
        .await?;
        tx.commit().await?;
        Ok(entry)
    }

    /// Create a new account, crediting the configured opening bonus.
    pub async fn create_account(&self) -> LedgerResult<Account> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "INSERT INTO accounts (balance) VALUES (0)
             RETURNING id, currency, created_at, updated_at",
        )
        .fetch_one(&mut *tx)
        .await?;

        let account_id: AccountId = row.get("id");
        let mut balance = 0;

        if self.opening_balance > 0 {
            let entry = Self::record(
                &mut tx,
                account_id,
                self.opening_balance,
                EntryKind::Deposit,
                EntryRefs::none(),
                &format!("signup_bonus_{account_id}"),
                Some("Welcome bonus".to_string()),
            )
            .await?;
            balance = entry.balance_after;
        }

        tx.commit().await?;

        Ok(Account {
            id: account_id,
            balance,
            currency: row.get("currency"),
            created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
            updated_at: row.get::<chrono::NaiveDateTime, _>("updated_at").and_utc(),
        })
    }

    /// Get an account by id
    pub async fn get_account(&self, account_id: AccountId) -> LedgerResult<Account> {
        let row = sqlx::query(
            "SELECT id, balance, currency, created_at, updated_at FROM accounts WHERE id = $1",
        )
        .bind(account_id)
        .fetch_optional(self.pool.as_ref())
        .await?
        .ok_or(LedgerError::AccountNotFound(account_id))?;

        Ok(Account {
            id: row.get("id"),
            balance: row.get("balance"),
            currency: row.get("currency"),
            created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
            updated_at: row.get::<chrono::NaiveDateTime, _>("updated_at").and_utc(),
        })
    }

    /// Advisory affordability check (`balance >= amount`).
    ///
    /// Only a pre-validation convenience; the authoritative check happens
    /// inside [`LedgerManager::record`] where it is atomic with the debit.
    pub async fn can_afford(&self, account_id: AccountId, amount: i64) -> LedgerResult<bool> {
        let account = self.get_account(account_id).await?;
        Ok(account.balance >= amount)
    }

    /// Get ledger entries for an account, newest first
    pub async fn entries_for_account(
        &self,
        account_id: AccountId,
        limit: i64,
    ) -> LedgerResult<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, amount, balance_after, direction, kind,
                   wager_id, match_id, idempotency_key, description, created_at
            FROM ledger_entries
            WHERE account_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(account_id)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(entry_from_row).collect()
    }

    /// Get all entries attached to a wager, oldest first (audit view)
    pub async fn entries_for_wager(&self, wager_id: i64) -> LedgerResult<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, amount, balance_after, direction, kind,
                   wager_id, match_id, idempotency_key, description, created_at
            FROM ledger_entries
            WHERE wager_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(wager_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(entry_from_row).collect()
    }

    /// Reconstruct an account balance by folding its entry log.
    ///
    /// With `up_to = None` the result must equal the cached
    /// `accounts.balance`; with a timestamp it yields the historical balance
    /// at that point.
    pub async fn replayed_balance(
        &self,
        account_id: AccountId,
        up_to: Option<DateTime<Utc>>,
    ) -> LedgerResult<i64> {
        // SUM(bigint) widens to NUMERIC; cast back for decoding
        let row = match up_to {
            Some(cutoff) => {
                sqlx::query(
                    "SELECT COALESCE(SUM(amount), 0)::BIGINT AS total
                     FROM ledger_entries
                     WHERE account_id = $1 AND created_at <= $2",
                )
                .bind(account_id)
                .bind(cutoff.naive_utc())
                .fetch_one(self.pool.as_ref())
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT COALESCE(SUM(amount), 0)::BIGINT AS total
                     FROM ledger_entries
                     WHERE account_id = $1",
                )
                .bind(account_id)
                .fetch_one(self.pool.as_ref())
                .await?
            }
        };

        Ok(row.get("total"))
    }
}

/// Map a ledger row, rejecting rows whose kind is no longer known.
fn entry_from_row(row: PgRow) -> LedgerResult<LedgerEntry> {
    let kind: EntryKind = row
        .get::<String, _>("kind")
        .parse()
        .map_err(|e: ParseKindError| LedgerError::Database(sqlx::Error::Decode(Box::new(e))))?;

    Ok(LedgerEntry {
        id: row.get("id"),
        account_id: row.get("account_id"),
        amount: row.get("amount"),
        balance_after: row.get("balance_after"),
        direction: kind.direction(),
        kind,
        wager_id: row.get("wager_id"),
        match_id: row.get("match_id"),
        idempotency_key: row.get("idempotency_key"),
        description: row.get("description"),
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
    })
}
