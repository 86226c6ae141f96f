//! Wager API handlers.
//!
//! Create, accept, cancel and list head-to-head wagers. Every state change
//! delegates to the settlement coordinator; the handlers only shape JSON.
//!
//! # Examples
//!
//! Create a R$ 25.00 wager:
//! ```bash
//! curl -X POST http://localhost:6464/api/v1/wagers \
//!   -H "Content-Type: application/json" \
//!   -d '{"account_id": 2, "stake": 2500}'
//! ```

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use cue_stakes::matches::Match;
use cue_stakes::settlement::BettingHistory;
use cue_stakes::wager::{FeeBreakdown, Wager};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState, ErrorResponse, settlement_error};
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct CreateWagerRequest {
    pub account_id: i64,
    /// Stake in minor units
    pub stake: i64,
}

#[derive(Debug, Deserialize)]
pub struct AcceptWagerRequest {
    pub account_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CancelWagerRequest {
    pub account_id: i64,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeesRequest {
    pub stake: i64,
}

#[derive(Debug, Serialize)]
pub struct CreateWagerResponse {
    pub wager: Wager,
    pub fees: FeeBreakdown,
}

#[derive(Debug, Serialize)]
pub struct AcceptWagerResponse {
    pub wager: Wager,
    #[serde(rename = "match")]
    pub game: Match,
}

/// List open wagers, newest first.
///
/// # Query Parameters
///
/// - `limit`: Maximum wagers to return (default 20, capped at 50)
pub async fn list_open(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Wager>>, ApiError> {
    let wagers = state
        .settlement
        .list_open_wagers(query.limit)
        .await
        .map_err(settlement_error)?;
    Ok(Json(wagers))
}

/// Create a wager, holding the creator's stake in escrow.
///
/// # Response
///
/// Returns `201 Created` with the wager and its fee breakdown.
///
/// # Errors
///
/// - `400 Bad Request`: Stake out of bounds or insufficient funds
/// - `404 Not Found`: Unknown account
pub async fn create_wager(
    State(state): State<AppState>,
    Json(request): Json<CreateWagerRequest>,
) -> Result<(StatusCode, Json<CreateWagerResponse>), ApiError> {
    let wager = state
        .settlement
        .create_wager(request.account_id, request.stake)
        .await
        .map_err(settlement_error)?;

    metrics::wagers_created_total();
    metrics::stake_amount(wager.stake);

    let fees = FeeBreakdown::for_stake(wager.stake);
    Ok((StatusCode::CREATED, Json(CreateWagerResponse { wager, fees })))
}

/// Get a wager by id.
pub async fn get_wager(
    State(state): State<AppState>,
    Path(wager_id): Path<i64>,
) -> Result<Json<Wager>, ApiError> {
    let wager = state
        .settlement
        .get_wager(wager_id)
        .await
        .map_err(settlement_error)?;
    Ok(Json(wager))
}

/// Accept an open wager, holding the opponent's stake and creating the match.
///
/// # Errors
///
/// - `400 Bad Request`: Self-match or insufficient funds
/// - `404 Not Found`: Unknown wager
/// - `409 Conflict`: Wager no longer open (e.g. lost an accept race)
pub async fn accept_wager(
    State(state): State<AppState>,
    Path(wager_id): Path<i64>,
    Json(request): Json<AcceptWagerRequest>,
) -> Result<Json<AcceptWagerResponse>, ApiError> {
    let (wager, game) = state
        .settlement
        .accept_wager(wager_id, request.account_id)
        .await
        .map_err(settlement_error)?;

    metrics::wagers_matched_total();

    Ok(Json(AcceptWagerResponse { wager, game }))
}

/// Cancel a wager, returning every held stake.
///
/// Only the creator may cancel.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not the creator
/// - `404 Not Found`: Unknown wager
/// - `409 Conflict`: Wager already completed or cancelled
pub async fn cancel_wager(
    State(state): State<AppState>,
    Path(wager_id): Path<i64>,
    Json(request): Json<CancelWagerRequest>,
) -> Result<Json<Wager>, ApiError> {
    let wager = state
        .settlement
        .get_wager(wager_id)
        .await
        .map_err(settlement_error)?;

    if wager.creator_id != request.account_id {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "Only the creator can cancel a wager".to_string(),
            }),
        ));
    }

    let reason = request
        .reason
        .unwrap_or_else(|| "Cancelled by creator".to_string());
    let wager = state
        .settlement
        .cancel_wager(wager_id, &reason)
        .await
        .map_err(settlement_error)?;

    metrics::wagers_cancelled_total();

    Ok(Json(wager))
}

/// Preview the fee breakdown for a stake without creating anything.
///
/// # Response
///
/// ```json
/// {"stake": 2500, "total_pot": 5000, "platform_fee": 250, "total_prize": 4750}
/// ```
pub async fn calculate_fees(
    State(state): State<AppState>,
    Json(request): Json<FeesRequest>,
) -> Result<Json<FeeBreakdown>, ApiError> {
    let limits = state.settlement.limits();
    if !limits.allows(request.stake) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!(
                    "Invalid amount: {} (allowed {}..={})",
                    request.stake, limits.min_stake, limits.max_stake
                ),
            }),
        ));
    }

    Ok(Json(FeeBreakdown::for_stake(request.stake)))
}

/// List all wagers an account created or accepted, newest first.
pub async fn list_for_account(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
) -> Result<Json<Vec<Wager>>, ApiError> {
    let wagers = state
        .settlement
        .wagers_for_account(account_id)
        .await
        .map_err(settlement_error)?;
    Ok(Json(wagers))
}

/// Completed-wager history with win/loss stats.
pub async fn betting_history(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> Result<Json<BettingHistory>, ApiError> {
    let history = state
        .settlement
        .betting_history(account_id, query.limit)
        .await
        .map_err(settlement_error)?;
    Ok(Json(history))
}
