//! Domain types shared by the ledger engine, storage layer and routes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "varchar", rename_all = "UPPERCASE")]
pub enum TransactionType {
    Deposit,
    Withdraw,
}

/// Transaction lifecycle. `Pending` is the only non-terminal state and the
/// only legal transitions are `Pending -> Approved` and `Pending -> Denied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "varchar", rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Pending,
    Approved,
    Denied,
}

impl TransactionStatus {
    pub fn is_final(&self) -> bool {
        match self {
            TransactionStatus::Pending => false,
            TransactionStatus::Approved | TransactionStatus::Denied => true,
        }
    }
}

/// Counterparty classification. Drives the withdrawal feature-flag check:
/// `Payment` requires `active_for_shopping`, `Iban` requires
/// `active_for_withdraw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "varchar", rename_all = "UPPERCASE")]
pub enum OppositePartyType {
    Payment,
    Iban,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "varchar", rename_all = "UPPERCASE")]
pub enum Currency {
    Try,
    Usd,
    Eur,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "varchar", rename_all = "UPPERCASE")]
pub enum Role {
    Customer,
    Employee,
}

/// The unit of consistency. `version` is bumped by the storage layer on every
/// committed mutation and checked by the optimistic concurrency guard.
#[derive(Debug, Clone, FromRow)]
pub struct Wallet {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub wallet_name: String,
    pub currency: Currency,
    pub active_for_shopping: bool,
    pub active_for_withdraw: bool,
    pub balance: Decimal,
    pub usable_balance: Decimal,
    pub version: i64,
}

/// Immutable after creation apart from `status`.
#[derive(Debug, Clone, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub amount: Decimal,
    pub tx_type: TransactionType,
    pub opposite_party_type: OppositePartyType,
    pub opposite_party: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        wallet_id: Uuid,
        amount: Decimal,
        tx_type: TransactionType,
        opposite_party_type: OppositePartyType,
        opposite_party: String,
        status: TransactionStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet_id,
            amount,
            tx_type,
            opposite_party_type,
            opposite_party,
            status,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// Read-only projection returned to callers. Never exposes the wallet's
/// version counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub opposite_party_type: OppositePartyType,
    pub opposite_party: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionView {
    fn from(t: Transaction) -> Self {
        Self {
            id: t.id,
            wallet_id: t.wallet_id,
            amount: t.amount,
            tx_type: t.tx_type,
            opposite_party_type: t.opposite_party_type,
            opposite_party: t.opposite_party,
            status: t.status,
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total: self.total,
        }
    }
}
