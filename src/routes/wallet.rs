use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::customers::CustomerRepository;
use crate::engine::{EngineError, Ledger};
use crate::model::{Currency, Wallet};

use super::{auth::AuthService, utils, utils::ApiError};

type WalletState = (Arc<AuthService>, Arc<Ledger>, PgPool);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWalletRequest {
    pub customer_id: Uuid,
    pub wallet_name: String,
    pub currency: Currency,
    #[serde(default)]
    pub active_for_shopping: bool,
    #[serde(default)]
    pub active_for_withdraw: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub wallet_name: String,
    pub currency: Currency,
    pub active_for_shopping: bool,
    pub active_for_withdraw: bool,
    pub balance: Decimal,
    pub usable_balance: Decimal,
}

impl From<Wallet> for WalletResponse {
    fn from(w: Wallet) -> Self {
        Self {
            id: w.id,
            customer_id: w.customer_id,
            wallet_name: w.wallet_name,
            currency: w.currency,
            active_for_shopping: w.active_for_shopping,
            active_for_withdraw: w.active_for_withdraw,
            balance: w.balance,
            usable_balance: w.usable_balance,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListWalletsQuery {
    pub customer_id: Option<Uuid>,
    pub currency: Option<Currency>,
}

// wallet creation is an employee operation; the ledger only accepts the
// initial zero-balance record
async fn create_wallet(
    headers: HeaderMap,
    State((service, ledger, pool)): State<WalletState>,
    Json(req): Json<CreateWalletRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = utils::validate_auth_token(&headers, &service)?;
    utils::require_employee(&claims)?;

    let customers = CustomerRepository::new(pool);
    let customer = customers
        .find_by_id(req.customer_id)
        .await
        .map_err(EngineError::Storage)?;
    if customer.is_none() {
        return Err(EngineError::CustomerNotFound(req.customer_id).into());
    }

    let wallet = ledger
        .create_wallet(
            req.customer_id,
            &req.wallet_name,
            req.currency,
            req.active_for_shopping,
            req.active_for_withdraw,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(WalletResponse::from(wallet))))
}

async fn list_wallets(
    headers: HeaderMap,
    State((service, ledger, _pool)): State<WalletState>,
    Query(query): Query<ListWalletsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    utils::validate_auth_token(&headers, &service)?;

    let wallets = ledger
        .list_wallets(query.customer_id, query.currency)
        .await?;
    let body: Vec<WalletResponse> = wallets.into_iter().map(WalletResponse::from).collect();

    Ok((StatusCode::OK, Json(body)))
}

pub fn wallet_routes(service: Arc<AuthService>, ledger: Arc<Ledger>, pool: PgPool) -> Router {
    Router::new()
        .route("/wallets", post(create_wallet).get(list_wallets))
        .with_state((service, ledger, pool))
}
