//! Postgres-backed `LedgerStore`.
//!
//! Each commit method runs one database transaction: the wallet row is
//! updated with a conditional write on its version counter, and the
//! transaction row is written alongside. Zero rows affected on the wallet
//! update means another commit got there first since our read.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::engine::{Commit, EngineError, LedgerStore};
use crate::model::{Currency, Page, Transaction, TransactionStatus, Wallet};

const WALLET_COLUMNS: &str = "id, customer_id, wallet_name, currency, active_for_shopping, \
     active_for_withdraw, balance, usable_balance, version";

const TRANSACTION_COLUMNS: &str =
    "id, wallet_id, amount, tx_type, opposite_party_type, opposite_party, status, created_at";

pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Conditional balance write. Returns false when the stored version no
    /// longer matches `expected_version`.
    async fn update_wallet_guarded(
        db_tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        wallet: &Wallet,
        expected_version: i64,
    ) -> Result<bool, sqlx::Error> {
        let updated = sqlx::query(
            "UPDATE wallets SET balance = $1, usable_balance = $2, version = version + 1 \
             WHERE id = $3 AND version = $4",
        )
        .bind(wallet.balance)
        .bind(wallet.usable_balance)
        .bind(wallet.id)
        .bind(expected_version)
        .execute(&mut **db_tx)
        .await?;
        Ok(updated.rows_affected() == 1)
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn load_wallet(&self, id: Uuid) -> Result<Option<Wallet>, EngineError> {
        let wallet = sqlx::query_as::<_, Wallet>(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallets WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(wallet)
    }

    async fn create_wallet(&self, wallet: &Wallet) -> Result<(), EngineError> {
        sqlx::query(
            "INSERT INTO wallets (id, customer_id, wallet_name, currency, active_for_shopping, \
             active_for_withdraw, balance, usable_balance, version) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(wallet.id)
        .bind(wallet.customer_id)
        .bind(&wallet.wallet_name)
        .bind(wallet.currency)
        .bind(wallet.active_for_shopping)
        .bind(wallet.active_for_withdraw)
        .bind(wallet.balance)
        .bind(wallet.usable_balance)
        .bind(wallet.version)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_wallets(
        &self,
        customer_id: Option<Uuid>,
        currency: Option<Currency>,
    ) -> Result<Vec<Wallet>, EngineError> {
        let mut query_builder = sqlx::QueryBuilder::new(format!(
            "SELECT {WALLET_COLUMNS} FROM wallets WHERE 1 = 1"
        ));
        if let Some(customer_id) = customer_id {
            query_builder.push(" AND customer_id = ").push_bind(customer_id);
        }
        if let Some(currency) = currency {
            query_builder.push(" AND currency = ").push_bind(currency);
        }

        let wallets = query_builder
            .build_query_as::<Wallet>()
            .fetch_all(&self.pool)
            .await?;
        Ok(wallets)
    }

    async fn commit_submission(
        &self,
        wallet: &Wallet,
        expected_version: i64,
        tx: &Transaction,
    ) -> Result<Commit, EngineError> {
        let mut db_tx = self.pool.begin().await?;

        if !Self::update_wallet_guarded(&mut db_tx, wallet, expected_version).await? {
            db_tx.rollback().await?;
            return Ok(Commit::VersionConflict);
        }

        sqlx::query(&format!(
            "INSERT INTO transactions ({TRANSACTION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(tx.id)
        .bind(tx.wallet_id)
        .bind(tx.amount)
        .bind(tx.tx_type)
        .bind(tx.opposite_party_type)
        .bind(&tx.opposite_party)
        .bind(tx.status)
        .bind(tx.created_at)
        .execute(&mut *db_tx)
        .await?;

        db_tx.commit().await?;
        Ok(Commit::Applied)
    }

    async fn load_transaction(&self, id: Uuid) -> Result<Option<Transaction>, EngineError> {
        let tx = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tx)
    }

    async fn commit_finalization(
        &self,
        wallet: &Wallet,
        expected_version: i64,
        tx_id: Uuid,
        status: TransactionStatus,
    ) -> Result<Commit, EngineError> {
        let mut db_tx = self.pool.begin().await?;

        if !Self::update_wallet_guarded(&mut db_tx, wallet, expected_version).await? {
            db_tx.rollback().await?;
            return Ok(Commit::VersionConflict);
        }

        sqlx::query("UPDATE transactions SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(tx_id)
            .execute(&mut *db_tx)
            .await?;

        db_tx.commit().await?;
        Ok(Commit::Applied)
    }

    async fn list_transactions(
        &self,
        wallet_id: Uuid,
        page: i64,
        size: i64,
    ) -> Result<Page<Transaction>, EngineError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM transactions WHERE wallet_id = $1",
        )
        .bind(wallet_id)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE wallet_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(wallet_id)
        .bind(size)
        .bind(page * size)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page {
            items,
            page,
            size,
            total,
        })
    }
}
