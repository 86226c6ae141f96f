//! Match API handlers.
//!
//! Start a match and report its outcome. Reporting a result settles the
//! linked wager atomically inside the settlement coordinator.

use axum::{
    extract::{Path, State},
    Json,
};
use cue_stakes::matches::Match;
use cue_stakes::wager::Wager;
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState, settlement_error};
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct ReportResultRequest {
    pub winner_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ReportResultResponse {
    #[serde(rename = "match")]
    pub game: Match,
    /// The settled wager, when one was linked
    pub wager: Option<Wager>,
}

/// Get a match by id.
pub async fn get_match(
    State(state): State<AppState>,
    Path(match_id): Path<i64>,
) -> Result<Json<Match>, ApiError> {
    let game = state
        .settlement
        .get_match(match_id)
        .await
        .map_err(settlement_error)?;
    Ok(Json(game))
}

/// Start a match (`waiting -> playing`).
///
/// # Errors
///
/// - `404 Not Found`: Unknown match
/// - `409 Conflict`: Match already started or finished
pub async fn start_match(
    State(state): State<AppState>,
    Path(match_id): Path<i64>,
) -> Result<Json<Match>, ApiError> {
    let game = state
        .settlement
        .start_match(match_id)
        .await
        .map_err(settlement_error)?;
    Ok(Json(game))
}

/// Report a match outcome, settling the linked wager in the same transaction.
///
/// # Errors
///
/// - `400 Bad Request`: Winner is not one of the players
/// - `404 Not Found`: Unknown match
/// - `409 Conflict`: Match is not in the `playing` state
pub async fn report_result(
    State(state): State<AppState>,
    Path(match_id): Path<i64>,
    Json(request): Json<ReportResultRequest>,
) -> Result<Json<ReportResultResponse>, ApiError> {
    let (game, wager) = state
        .settlement
        .report_match_result(match_id, request.winner_id)
        .await
        .map_err(settlement_error)?;

    if wager.is_some() {
        metrics::wagers_completed_total();
    }

    Ok(Json(ReportResultResponse { game, wager }))
}
