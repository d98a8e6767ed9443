//! Wallet ledger engine.
//!
//! Owns the transaction state machine and the dual-balance accounting rules.
//! Every operation is one logical unit of work against a single wallet,
//! committed through the storage layer's conditional write; a version
//! mismatch is retried here against a freshly reloaded wallet before it is
//! surfaced to the caller.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::model::{
    Currency, OppositePartyType, Page, Transaction, TransactionStatus, TransactionType,
    TransactionView, Wallet,
};

mod balance;
mod error;
mod policy;
mod store;

pub use error::EngineError;
pub use policy::{requires_approval, APPROVAL_THRESHOLD};
pub use store::{Commit, IdempotencyGuard, LedgerStore, Reservation};

/// Endpoint names the idempotency guard keys on, together with the
/// caller-supplied key.
pub const DEPOSIT_ENDPOINT: &str = "transactions/deposits";
pub const WITHDRAW_ENDPOINT: &str = "transactions/withdrawals";

/// How many times a version conflict is retried from a fresh read before
/// giving up with `ConcurrentModification`.
const MAX_COMMIT_ATTEMPTS: u32 = 3;

pub struct Ledger {
    store: Arc<dyn LedgerStore>,
    idempotency: Arc<dyn IdempotencyGuard>,
}

/// Public API
impl Ledger {
    pub fn new(store: Arc<dyn LedgerStore>, idempotency: Arc<dyn IdempotencyGuard>) -> Self {
        Self { store, idempotency }
    }

    /// Submit a deposit. Amounts above the approval threshold settle as
    /// `PENDING` and credit only the total balance; smaller amounts are
    /// approved on the spot and credit both figures.
    pub async fn deposit(
        &self,
        wallet_id: Uuid,
        amount: Decimal,
        opposite_party_type: OppositePartyType,
        source: &str,
        idempotency_key: &str,
    ) -> Result<TransactionView, EngineError> {
        validate_amount(amount)?;
        validate_counterparty(source)?;
        self.reserve(idempotency_key, DEPOSIT_ENDPOINT).await?;

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let mut wallet = self
                .store
                .load_wallet(wallet_id)
                .await?
                .ok_or(EngineError::WalletNotFound(wallet_id))?;
            let expected_version = wallet.version;

            let pending = policy::requires_approval(amount);
            wallet.credit_deposit(amount, pending);

            let tx = Transaction::new(
                wallet_id,
                amount,
                TransactionType::Deposit,
                opposite_party_type,
                source.to_string(),
                if pending {
                    TransactionStatus::Pending
                } else {
                    TransactionStatus::Approved
                },
            );

            match self
                .store
                .commit_submission(&wallet, expected_version, &tx)
                .await?
            {
                Commit::Applied => {
                    info!(
                        wallet = %wallet_id,
                        tx = %tx.id,
                        amount = %amount,
                        status = ?tx.status,
                        "deposit applied"
                    );
                    return Ok(tx.into());
                }
                Commit::VersionConflict => {
                    warn!(wallet = %wallet_id, attempt, "deposit commit conflicted, reloading wallet");
                }
            }
        }

        Err(EngineError::ConcurrentModification)
    }

    /// Submit a withdrawal. The counterparty type picks which feature flag
    /// must be on, and the amount must be usable at submission time whether
    /// the withdrawal settles instantly or as a reservation.
    pub async fn withdraw(
        &self,
        wallet_id: Uuid,
        amount: Decimal,
        opposite_party_type: OppositePartyType,
        destination: &str,
        idempotency_key: &str,
    ) -> Result<TransactionView, EngineError> {
        validate_amount(amount)?;
        validate_counterparty(destination)?;
        self.reserve(idempotency_key, WITHDRAW_ENDPOINT).await?;

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let mut wallet = self
                .store
                .load_wallet(wallet_id)
                .await?
                .ok_or(EngineError::WalletNotFound(wallet_id))?;
            let expected_version = wallet.version;

            match opposite_party_type {
                OppositePartyType::Payment => {
                    if !wallet.active_for_shopping {
                        return Err(EngineError::NotActiveForShopping);
                    }
                }
                OppositePartyType::Iban => {
                    if !wallet.active_for_withdraw {
                        return Err(EngineError::NotActiveForWithdraw);
                    }
                }
            }

            let pending = policy::requires_approval(amount);
            wallet.debit_withdrawal(amount, pending)?;

            let tx = Transaction::new(
                wallet_id,
                amount,
                TransactionType::Withdraw,
                opposite_party_type,
                destination.to_string(),
                if pending {
                    TransactionStatus::Pending
                } else {
                    TransactionStatus::Approved
                },
            );

            match self
                .store
                .commit_submission(&wallet, expected_version, &tx)
                .await?
            {
                Commit::Applied => {
                    info!(
                        wallet = %wallet_id,
                        tx = %tx.id,
                        amount = %amount,
                        status = ?tx.status,
                        "withdrawal applied"
                    );
                    return Ok(tx.into());
                }
                Commit::VersionConflict => {
                    warn!(wallet = %wallet_id, attempt, "withdrawal commit conflicted, reloading wallet");
                }
            }
        }

        Err(EngineError::ConcurrentModification)
    }

    /// Finalize a pending transaction. The target status must be `APPROVED`
    /// or `DENIED`; a transaction can be finalized exactly once.
    pub async fn approve_or_deny(
        &self,
        transaction_id: Uuid,
        target: TransactionStatus,
    ) -> Result<TransactionView, EngineError> {
        let approved = match target {
            TransactionStatus::Pending => {
                return Err(EngineError::validation("status must be APPROVED or DENIED"))
            }
            TransactionStatus::Approved => true,
            TransactionStatus::Denied => false,
        };

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let tx = self
                .store
                .load_transaction(transaction_id)
                .await?
                .ok_or(EngineError::TransactionNotFound(transaction_id))?;

            if tx.status.is_final() {
                return Err(EngineError::AlreadyFinalized(transaction_id));
            }

            let mut wallet = self
                .store
                .load_wallet(tx.wallet_id)
                .await?
                .ok_or(EngineError::Inconsistent(
                    "transaction references a missing wallet",
                ))?;
            let expected_version = wallet.version;

            match tx.tx_type {
                TransactionType::Deposit => wallet.settle_deposit(tx.amount, approved)?,
                TransactionType::Withdraw => wallet.settle_withdrawal(tx.amount, approved)?,
            }

            match self
                .store
                .commit_finalization(&wallet, expected_version, tx.id, target)
                .await?
            {
                Commit::Applied => {
                    info!(
                        wallet = %wallet.id,
                        tx = %tx.id,
                        amount = %tx.amount,
                        status = ?target,
                        "transaction finalized"
                    );
                    let mut finalized = tx;
                    finalized.status = target;
                    return Ok(finalized.into());
                }
                Commit::VersionConflict => {
                    warn!(tx = %transaction_id, attempt, "finalization commit conflicted, reloading");
                }
            }
        }

        Err(EngineError::ConcurrentModification)
    }

    /// Paginated transaction history for one wallet. Pure read, delegates to
    /// storage pagination.
    pub async fn list_transactions(
        &self,
        wallet_id: Uuid,
        page: i64,
        size: i64,
    ) -> Result<Page<TransactionView>, EngineError> {
        if page < 0 {
            return Err(EngineError::validation("page must not be negative"));
        }
        if size <= 0 || size > 100 {
            return Err(EngineError::validation("size must be between 1 and 100"));
        }
        let result = self.store.list_transactions(wallet_id, page, size).await?;
        Ok(result.map(TransactionView::from))
    }

    /// Administrative wallet creation: accepts the initial zero-balance
    /// record. Balance mutation only ever happens through submissions and
    /// finalizations.
    pub async fn create_wallet(
        &self,
        customer_id: Uuid,
        wallet_name: &str,
        currency: Currency,
        active_for_shopping: bool,
        active_for_withdraw: bool,
    ) -> Result<Wallet, EngineError> {
        if wallet_name.trim().is_empty() {
            return Err(EngineError::validation("walletName must not be blank"));
        }
        let wallet = Wallet {
            id: Uuid::new_v4(),
            customer_id,
            wallet_name: wallet_name.to_string(),
            currency,
            active_for_shopping,
            active_for_withdraw,
            balance: Decimal::ZERO,
            usable_balance: Decimal::ZERO,
            version: 0,
        };
        self.store.create_wallet(&wallet).await?;
        info!(wallet = %wallet.id, customer = %customer_id, "wallet created");
        Ok(wallet)
    }

    pub async fn list_wallets(
        &self,
        customer_id: Option<Uuid>,
        currency: Option<Currency>,
    ) -> Result<Vec<Wallet>, EngineError> {
        self.store.list_wallets(customer_id, currency).await
    }
}

/// Private API
impl Ledger {
    async fn reserve(&self, key: &str, endpoint: &str) -> Result<(), EngineError> {
        if key.trim().is_empty() {
            return Err(EngineError::validation("Idempotency-Key must not be blank"));
        }
        match self.idempotency.check_and_reserve(key, endpoint).await? {
            Reservation::Fresh => Ok(()),
            Reservation::Duplicate => {
                warn!(key, endpoint, "duplicate submission rejected");
                Err(EngineError::DuplicateRequest)
            }
        }
    }
}

fn validate_amount(amount: Decimal) -> Result<(), EngineError> {
    if amount <= Decimal::ZERO {
        return Err(EngineError::validation("amount must be positive"));
    }
    if amount.scale() > 2 {
        return Err(EngineError::validation(
            "amount must have at most 2 fractional digits",
        ));
    }
    Ok(())
}

fn validate_counterparty(party: &str) -> Result<(), EngineError> {
    if party.trim().is_empty() {
        return Err(EngineError::validation("opposite party must not be blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_must_be_positive() {
        assert!(validate_amount(Decimal::ZERO).is_err());
        assert!(validate_amount(Decimal::new(-100, 2)).is_err());
        assert!(validate_amount(Decimal::new(100, 2)).is_ok());
    }

    #[test]
    fn amount_scale_is_capped_at_two() {
        assert!(validate_amount(Decimal::new(10_001, 3)).is_err());
        assert!(validate_amount(Decimal::new(10_00, 2)).is_ok());
        assert!(validate_amount(Decimal::new(10, 0)).is_ok());
    }

    #[test]
    fn counterparty_must_not_be_blank() {
        assert!(validate_counterparty("").is_err());
        assert!(validate_counterparty("   ").is_err());
        assert!(validate_counterparty("TR330006100519786457841326").is_ok());
    }
}
