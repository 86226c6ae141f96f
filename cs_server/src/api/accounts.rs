//! Account API handlers.
//!
//! Accounts hold one balance each, in integer minor units. Balances only
//! move through ledger entries; these handlers are read-side except for
//! account creation.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use cue_stakes::ledger::{Account, LedgerEntry};
use serde::Deserialize;

use super::{ApiError, AppState, ledger_error};

#[derive(Debug, Deserialize)]
pub struct EntriesQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

/// Create a new account.
///
/// The account opens with the configured welcome bonus, recorded as a
/// deposit ledger entry.
///
/// # Response
///
/// Returns `201 Created` with the account:
/// ```json
/// {"id": 7, "balance": 5000, "currency": "BRL", ...}
/// ```
pub async fn create_account(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let account = state.ledger.create_account().await.map_err(ledger_error)?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// Get an account's current balance.
///
/// # Errors
///
/// - `404 Not Found`: Unknown account
pub async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
) -> Result<Json<Account>, ApiError> {
    let account = state
        .ledger
        .get_account(account_id)
        .await
        .map_err(ledger_error)?;
    Ok(Json(account))
}

/// List an account's ledger entries, newest first.
///
/// # Query Parameters
///
/// - `limit`: Maximum entries to return (default 20)
pub async fn list_entries(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
    Query(query): Query<EntriesQuery>,
) -> Result<Json<Vec<LedgerEntry>>, ApiError> {
    let entries = state
        .ledger
        .entries_for_account(account_id, query.limit.clamp(1, 50))
        .await
        .map_err(ledger_error)?;
    Ok(Json(entries))
}
