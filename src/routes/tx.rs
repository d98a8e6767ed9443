use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::Ledger;
use crate::model::{OppositePartyType, TransactionStatus};

use super::{auth::AuthService, utils, utils::ApiError};

type TxState = (Arc<AuthService>, Arc<Ledger>);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    pub wallet_id: Uuid,
    pub amount: Decimal,
    pub opposite_party_type: OppositePartyType,
    pub source: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    pub wallet_id: Uuid,
    pub amount: Decimal,
    pub opposite_party_type: OppositePartyType,
    pub destination: String,
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub status: TransactionStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTransactionsQuery {
    pub wallet_id: Uuid,
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub size: i64,
}

fn default_page_size() -> i64 {
    20
}

// Submissions must carry an Idempotency-Key so replays are rejected instead
// of re-run.
fn idempotency_key(headers: &HeaderMap) -> Result<String, ApiError> {
    match headers.get("Idempotency-Key").map(|value| value.to_str()) {
        Some(Ok(key)) if !key.trim().is_empty() => Ok(key.to_string()),
        _ => Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "Idempotency-Key header is required",
        )),
    }
}

async fn deposit(
    headers: HeaderMap,
    State((service, ledger)): State<TxState>,
    Json(req): Json<DepositRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Starting deposit submission");

    utils::validate_auth_token(&headers, &service)?;
    let key = idempotency_key(&headers)?;

    let view = ledger
        .deposit(
            req.wallet_id,
            req.amount,
            req.opposite_party_type,
            &req.source,
            &key,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(view)))
}

async fn withdraw(
    headers: HeaderMap,
    State((service, ledger)): State<TxState>,
    Json(req): Json<WithdrawRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Starting withdrawal submission");

    utils::validate_auth_token(&headers, &service)?;
    let key = idempotency_key(&headers)?;

    let view = ledger
        .withdraw(
            req.wallet_id,
            req.amount,
            req.opposite_party_type,
            &req.destination,
            &key,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(view)))
}

// finalize a PENDING transaction; employee only
async fn approve(
    headers: HeaderMap,
    State((service, ledger)): State<TxState>,
    Path(transaction_id): Path<Uuid>,
    Json(req): Json<ApproveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = utils::validate_auth_token(&headers, &service)?;
    utils::require_employee(&claims)?;

    let view = ledger.approve_or_deny(transaction_id, req.status).await?;

    Ok((StatusCode::OK, Json(view)))
}

// paginated transaction history for one wallet
async fn list_transactions(
    headers: HeaderMap,
    State((service, ledger)): State<TxState>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    utils::validate_auth_token(&headers, &service)?;

    let page = ledger
        .list_transactions(query.wallet_id, query.page, query.size)
        .await?;

    Ok((StatusCode::OK, Json(page)))
}

pub fn tx_routes(service: Arc<AuthService>, ledger: Arc<Ledger>) -> Router {
    Router::new()
        .route("/transactions/deposits", post(deposit))
        .route("/transactions/withdrawals", post(withdraw))
        .route("/transactions", get(list_transactions))
        .route("/transactions/:id/approve", post(approve))
        .with_state((service, ledger))
}
