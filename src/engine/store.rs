//! Collaborator interfaces consumed by the ledger engine.
//!
//! The engine never talks to Postgres directly; it goes through these traits
//! so the storage implementation stays swappable (the integration tests run
//! an in-memory store through the exact same code path).

use async_trait::async_trait;
use uuid::Uuid;

use crate::engine::error::EngineError;
use crate::model::{Currency, Page, Transaction, TransactionStatus, Wallet};

/// Outcome of a conditional commit against the wallet's version counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    Applied,
    /// Someone else committed against the wallet since our read. The caller
    /// must reload and redo the whole operation.
    VersionConflict,
}

/// Outcome of reserving an idempotency key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    Fresh,
    Duplicate,
}

/// Wallet and transaction persistence.
///
/// A submission commit (wallet write + transaction append) and a finalization
/// commit (wallet write + status update) are each one atomic unit, so they
/// live on a single trait rather than two per-record stores. Both commits are
/// conditional on `expected_version`; on success the store bumps the wallet
/// version by one.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn load_wallet(&self, id: Uuid) -> Result<Option<Wallet>, EngineError>;

    async fn create_wallet(&self, wallet: &Wallet) -> Result<(), EngineError>;

    async fn list_wallets(
        &self,
        customer_id: Option<Uuid>,
        currency: Option<Currency>,
    ) -> Result<Vec<Wallet>, EngineError>;

    /// Atomically persist the mutated wallet balances and append the new
    /// transaction, iff the stored wallet version still equals
    /// `expected_version`.
    async fn commit_submission(
        &self,
        wallet: &Wallet,
        expected_version: i64,
        tx: &Transaction,
    ) -> Result<Commit, EngineError>;

    async fn load_transaction(&self, id: Uuid) -> Result<Option<Transaction>, EngineError>;

    /// Atomically persist the mutated wallet balances and flip the
    /// transaction status, iff the stored wallet version still equals
    /// `expected_version`.
    async fn commit_finalization(
        &self,
        wallet: &Wallet,
        expected_version: i64,
        tx_id: Uuid,
        status: TransactionStatus,
    ) -> Result<Commit, EngineError>;

    async fn list_transactions(
        &self,
        wallet_id: Uuid,
        page: i64,
        size: i64,
    ) -> Result<Page<Transaction>, EngineError>;
}

/// Duplicate-submission guard keyed by caller-supplied key plus endpoint
/// name. Reservation happens before any balance mutation.
#[async_trait]
pub trait IdempotencyGuard: Send + Sync {
    async fn check_and_reserve(
        &self,
        key: &str,
        endpoint: &str,
    ) -> Result<Reservation, EngineError>;
}
