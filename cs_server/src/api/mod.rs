//! HTTP API for the wagering platform.
//!
//! This module provides the REST API over the core managers. No business
//! logic lives here: handlers validate JSON shapes, invoke a single core
//! operation, and map its typed result to a response.
//!
//! # Modules
//!
//! - [`accounts`]: Account creation, balances and ledger entries
//! - [`wagers`]: Wager lifecycle (create, accept, cancel) and listings
//! - [`matches`]: Match start and result reporting
//! - [`payments`]: Deposits, withdrawals and the gateway webhook
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                               - Health check (public)
//! POST /api/v1/accounts                      - Create account
//! GET  /api/v1/accounts/{id}                 - Account balance
//! GET  /api/v1/accounts/{id}/entries         - Ledger entries
//! GET  /api/v1/accounts/{id}/wagers          - Wagers created or accepted
//! GET  /api/v1/accounts/{id}/history         - Completed-wager history
//! GET  /api/v1/accounts/{id}/transactions    - Payment intents
//! GET  /api/v1/wagers                        - List open wagers
//! POST /api/v1/wagers                        - Create wager
//! GET  /api/v1/wagers/{id}                   - Get wager
//! POST /api/v1/wagers/{id}/accept            - Accept wager
//! POST /api/v1/wagers/{id}/cancel            - Cancel wager
//! POST /api/v1/wagers/fees                   - Fee preview for a stake
//! GET  /api/v1/matches/{id}                  - Get match
//! POST /api/v1/matches/{id}/start            - Start match
//! POST /api/v1/matches/{id}/result           - Report match outcome
//! POST /api/v1/payments/deposit/pix          - Start a PIX deposit
//! POST /api/v1/payments/deposit/card         - Charge a tokenized card
//! POST /api/v1/payments/withdraw             - Request a withdrawal
//! POST /api/v1/payments/webhook              - Gateway notification (idempotent)
//! ```

pub mod accounts;
pub mod matches;
pub mod payments;
pub mod wagers;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use cue_stakes::gateway::{PaymentError, PaymentManager};
use cue_stakes::ledger::{LedgerError, LedgerManager};
use cue_stakes::settlement::{SettlementError, SettlementManager};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request (cheap due to Arc wrappers).
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<LedgerManager>,
    pub settlement: Arc<SettlementManager>,
    pub payments: Arc<PaymentManager>,
    pub pool: Arc<PgPool>,
}

/// JSON error body for all failing responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn settlement_error(e: SettlementError) -> ApiError {
    let status = match &e {
        SettlementError::InvalidAmount { .. }
        | SettlementError::InsufficientFunds { .. }
        | SettlementError::InvalidWinner(_)
        | SettlementError::SelfMatch
        | SettlementError::Ledger(_) => StatusCode::BAD_REQUEST,
        SettlementError::InvalidState { .. } | SettlementError::ConcurrencyConflict => {
            StatusCode::CONFLICT
        }
        SettlementError::WagerNotFound(_)
        | SettlementError::MatchNotFound(_)
        | SettlementError::AccountNotFound(_) => StatusCode::NOT_FOUND,
        SettlementError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse {
            error: e.client_message(),
        }),
    )
}

pub(crate) fn ledger_error(e: LedgerError) -> ApiError {
    let status = match &e {
        LedgerError::AccountNotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };

    (
        status,
        Json(ErrorResponse {
            error: e.client_message(),
        }),
    )
}

pub(crate) fn payment_error(e: PaymentError) -> ApiError {
    let status = match &e {
        PaymentError::AccountNotFound(_) => StatusCode::NOT_FOUND,
        PaymentError::Gateway(_) => StatusCode::BAD_GATEWAY,
        PaymentError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };

    (
        status,
        Json(ErrorResponse {
            error: e.client_message(),
        }),
    )
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router();

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", v1_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/accounts", post(accounts::create_account))
        .route("/accounts/{account_id}", get(accounts::get_account))
        .route("/accounts/{account_id}/entries", get(accounts::list_entries))
        .route("/accounts/{account_id}/wagers", get(wagers::list_for_account))
        .route("/accounts/{account_id}/history", get(wagers::betting_history))
        .route(
            "/accounts/{account_id}/transactions",
            get(payments::list_transactions),
        )
        .route("/wagers", get(wagers::list_open).post(wagers::create_wager))
        .route("/wagers/{wager_id}", get(wagers::get_wager))
        .route("/wagers/{wager_id}/accept", post(wagers::accept_wager))
        .route("/wagers/{wager_id}/cancel", post(wagers::cancel_wager))
        .route("/wagers/fees", post(wagers::calculate_fees))
        .route("/matches/{match_id}", get(matches::get_match))
        .route("/matches/{match_id}/start", post(matches::start_match))
        .route("/matches/{match_id}/result", post(matches::report_result))
        .route("/payments/deposit/pix", post(payments::create_pix_deposit))
        .route("/payments/deposit/card", post(payments::create_card_deposit))
        .route("/payments/withdraw", post(payments::request_withdrawal))
        .route("/payments/webhook", post(payments::gateway_webhook))
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the database answers, `503 Service Unavailable`
/// otherwise.
///
/// ```bash
/// curl http://localhost:6464/health
/// # {"status":"healthy","database":true}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = sqlx::query("SELECT 1")
        .fetch_one(&*state.pool)
        .await
        .is_ok();

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(json!({
            "status": if db_healthy { "healthy" } else { "unhealthy" },
            "database": db_healthy,
            "timestamp": chrono::Utc::now(),
        })),
    )
}
