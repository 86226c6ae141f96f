//! Payment API handlers.
//!
//! Deposits, withdrawals and the gateway webhook. The webhook is
//! idempotent: the payment manager keys application on the intent's unique
//! external reference, so replays acknowledge without re-crediting.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use cue_stakes::gateway::{DepositReceipt, PaymentIntent, PaymentStatus, WebhookOutcome};
use log::warn;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ApiError, AppState, payment_error};
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct PixDepositRequest {
    pub account_id: i64,
    /// Amount in minor units
    pub amount: i64,
}

#[derive(Debug, Deserialize)]
pub struct CardDepositRequest {
    pub account_id: i64,
    pub amount: i64,
    pub card_token: String,
    #[serde(default = "default_installments")]
    pub installments: u32,
}

fn default_installments() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub account_id: i64,
    pub amount: i64,
    pub pix_key: String,
}

/// Gateway notification payload.
///
/// Either a processed result (`external_reference` + `status`) or a bare
/// payment id to look up at the gateway.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub external_reference: Option<String>,
    pub status: Option<PaymentStatus>,
    pub amount: Option<i64>,
    pub payment_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

/// Start a PIX deposit: returns the pending intent plus the QR code the
/// payer completes out of band.
pub async fn create_pix_deposit(
    State(state): State<AppState>,
    Json(request): Json<PixDepositRequest>,
) -> Result<(StatusCode, Json<DepositReceipt>), ApiError> {
    let receipt = state
        .payments
        .create_pix_deposit(request.account_id, request.amount)
        .await
        .map_err(payment_error)?;

    metrics::deposits_total("pix");

    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Charge a tokenized card. Synchronously approved charges are credited
/// before the response returns.
pub async fn create_card_deposit(
    State(state): State<AppState>,
    Json(request): Json<CardDepositRequest>,
) -> Result<(StatusCode, Json<DepositReceipt>), ApiError> {
    let receipt = state
        .payments
        .create_card_deposit(
            request.account_id,
            request.amount,
            request.card_token,
            request.installments,
        )
        .await
        .map_err(payment_error)?;

    metrics::deposits_total("credit_card");

    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Request a withdrawal. The wallet is debited immediately; the payout is
/// processed out of band and refunded if it fails.
pub async fn request_withdrawal(
    State(state): State<AppState>,
    Json(request): Json<WithdrawRequest>,
) -> Result<(StatusCode, Json<PaymentIntent>), ApiError> {
    let intent = state
        .payments
        .request_withdrawal(request.account_id, request.amount, request.pix_key)
        .await
        .map_err(payment_error)?;

    metrics::withdrawals_total();

    Ok((StatusCode::CREATED, Json(intent)))
}

/// Gateway webhook. Always answers `200 OK` so the gateway stops retrying;
/// application itself is idempotent and a replay is a no-op.
pub async fn gateway_webhook(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<Value>, ApiError> {
    let outcome = match (&payload.external_reference, payload.status) {
        (Some(reference), Some(status)) => state
            .payments
            .on_payment_result(reference, status, payload.amount.unwrap_or(0))
            .await
            .map_err(payment_error)?,
        _ => match &payload.payment_id {
            Some(payment_id) => state
                .payments
                .sync_payment(payment_id)
                .await
                .map_err(payment_error)?,
            None => {
                warn!("Webhook without reference or payment id, ignoring");
                WebhookOutcome::Ignored
            }
        },
    };

    let outcome_label = match outcome {
        WebhookOutcome::Applied(_) => "applied",
        WebhookOutcome::AlreadyProcessed => "already_processed",
        WebhookOutcome::Ignored => "ignored",
    };
    metrics::webhook_results_total(outcome_label);

    Ok(Json(json!({ "status": "ok", "outcome": outcome_label })))
}

/// List an account's payment intents, newest first.
pub async fn list_transactions(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<Vec<PaymentIntent>>, ApiError> {
    let intents = state
        .payments
        .intents_for_account(account_id, query.limit)
        .await
        .map_err(payment_error)?;
    Ok(Json(intents))
}
