//! Error taxonomy for ledger operations.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Everything a ledger operation can fail with. All variants abort the whole
/// operation with no partial balance mutation; only `ConcurrentModification`
/// is worth retrying, and the engine already retries it internally before
/// surfacing it.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Wallet not found: {0}")]
    WalletNotFound(Uuid),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),

    #[error("Customer not found: {0}")]
    CustomerNotFound(Uuid),

    #[error("{0}")]
    Validation(String),

    #[error("Wallet is not active for shopping")]
    NotActiveForShopping,

    #[error("Wallet is not active for withdraw")]
    NotActiveForWithdraw,

    #[error("Insufficient usable balance: available {available}, requested {requested}")]
    InsufficientFunds {
        available: Decimal,
        requested: Decimal,
    },

    #[error("Transaction is already finalized")]
    AlreadyFinalized(Uuid),

    #[error("Wallet was modified concurrently, retry the operation")]
    ConcurrentModification,

    #[error("Duplicate request for idempotency key")]
    DuplicateRequest,

    /// A state that the invariants rule out was observed. Programming or
    /// data defect, never a user error.
    #[error("Ledger inconsistency: {0}")]
    Inconsistent(&'static str),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }
}
