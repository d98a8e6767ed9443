//! Balance mutation engine.
//!
//! Every committed operation keeps two figures on the wallet mutually
//! consistent: `balance` (total funds) and `usable_balance` (funds free for
//! new withdrawals). A pending deposit raises only the total; a pending
//! withdrawal reserves only from the usable figure. Finalization closes the
//! gap in the direction the operator decided. At all times
//! `balance - usable_balance` equals the sum of pending transaction amounts.

use rust_decimal::Decimal;

use crate::engine::error::EngineError;
use crate::model::Wallet;

impl Wallet {
    /// The portion of `balance` tied up by pending transactions.
    pub fn pending_gap(&self) -> Decimal {
        self.balance - self.usable_balance
    }

    /// Deposit submission. Pending deposits credit only the total balance;
    /// auto-approved deposits credit both figures.
    pub fn credit_deposit(&mut self, amount: Decimal, pending: bool) {
        self.balance += amount;
        if !pending {
            self.usable_balance += amount;
        }
    }

    /// Withdrawal submission. Both paths need the funds usable up front:
    /// a pending withdrawal reserves them, an auto-approved one debits both
    /// figures immediately.
    pub fn debit_withdrawal(&mut self, amount: Decimal, pending: bool) -> Result<(), EngineError> {
        if self.usable_balance < amount {
            return Err(EngineError::InsufficientFunds {
                available: self.usable_balance,
                requested: amount,
            });
        }
        if !pending && self.balance < amount {
            return Err(EngineError::Inconsistent(
                "wallet balance below usable balance",
            ));
        }
        self.usable_balance -= amount;
        if !pending {
            self.balance -= amount;
        }
        Ok(())
    }

    /// Finalize a pending deposit. Approval releases the amount into the
    /// usable figure; denial takes the earlier total credit back out.
    pub fn settle_deposit(&mut self, amount: Decimal, approved: bool) -> Result<(), EngineError> {
        if approved {
            self.usable_balance += amount;
        } else {
            if self.balance < amount {
                return Err(EngineError::Inconsistent(
                    "denied deposit exceeds wallet balance",
                ));
            }
            self.balance -= amount;
        }
        Ok(())
    }

    /// Finalize a pending withdrawal. Approval honors the reservation by
    /// debiting the total; denial releases the reservation back to usable.
    pub fn settle_withdrawal(&mut self, amount: Decimal, approved: bool) -> Result<(), EngineError> {
        if approved {
            if self.balance < amount {
                return Err(EngineError::Inconsistent(
                    "approved withdrawal exceeds wallet balance",
                ));
            }
            self.balance -= amount;
        } else {
            self.usable_balance += amount;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Currency;
    use uuid::Uuid;

    fn wallet(balance: i64, usable: i64) -> Wallet {
        Wallet {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            wallet_name: "main".to_string(),
            currency: Currency::Try,
            active_for_shopping: true,
            active_for_withdraw: true,
            balance: Decimal::new(balance, 2),
            usable_balance: Decimal::new(usable, 2),
            version: 0,
        }
    }

    #[test]
    fn auto_approved_deposit_raises_both_figures() {
        let mut w = wallet(0, 0);
        w.credit_deposit(Decimal::new(950_00, 2), false);
        assert_eq!(w.balance, Decimal::new(950_00, 2));
        assert_eq!(w.usable_balance, Decimal::new(950_00, 2));
        assert_eq!(w.pending_gap(), Decimal::ZERO);
    }

    #[test]
    fn pending_deposit_raises_only_total() {
        let mut w = wallet(0, 0);
        w.credit_deposit(Decimal::new(1200_00, 2), true);
        assert_eq!(w.balance, Decimal::new(1200_00, 2));
        assert_eq!(w.usable_balance, Decimal::ZERO);
        assert_eq!(w.pending_gap(), Decimal::new(1200_00, 2));
    }

    #[test]
    fn auto_approved_withdrawal_lowers_both_figures() {
        let mut w = wallet(1000_00, 1000_00);
        w.debit_withdrawal(Decimal::new(400_00, 2), false).unwrap();
        assert_eq!(w.balance, Decimal::new(600_00, 2));
        assert_eq!(w.usable_balance, Decimal::new(600_00, 2));
    }

    #[test]
    fn pending_withdrawal_reserves_only_usable() {
        let mut w = wallet(5000_00, 5000_00);
        w.debit_withdrawal(Decimal::new(1300_00, 2), true).unwrap();
        assert_eq!(w.balance, Decimal::new(5000_00, 2));
        assert_eq!(w.usable_balance, Decimal::new(3700_00, 2));
        assert_eq!(w.pending_gap(), Decimal::new(1300_00, 2));
    }

    #[test]
    fn withdrawal_beyond_usable_is_rejected_and_leaves_wallet_untouched() {
        let mut w = wallet(1500_00, 300_00);
        let err = w.debit_withdrawal(Decimal::new(400_00, 2), true).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientFunds { .. }));
        assert_eq!(w.balance, Decimal::new(1500_00, 2));
        assert_eq!(w.usable_balance, Decimal::new(300_00, 2));
    }

    #[test]
    fn approving_pending_deposit_releases_to_usable() {
        let mut w = wallet(1200_00, 0);
        w.settle_deposit(Decimal::new(1200_00, 2), true).unwrap();
        assert_eq!(w.balance, Decimal::new(1200_00, 2));
        assert_eq!(w.usable_balance, Decimal::new(1200_00, 2));
    }

    #[test]
    fn denying_pending_deposit_reverts_total() {
        let mut w = wallet(1200_00, 0);
        w.settle_deposit(Decimal::new(1200_00, 2), false).unwrap();
        assert_eq!(w.balance, Decimal::ZERO);
        assert_eq!(w.usable_balance, Decimal::ZERO);
    }

    #[test]
    fn approving_pending_withdrawal_debits_total() {
        let mut w = wallet(5000_00, 3700_00);
        w.settle_withdrawal(Decimal::new(1300_00, 2), true).unwrap();
        assert_eq!(w.balance, Decimal::new(3700_00, 2));
        assert_eq!(w.usable_balance, Decimal::new(3700_00, 2));
    }

    #[test]
    fn denying_pending_withdrawal_releases_reservation() {
        let mut w = wallet(5000_00, 3700_00);
        w.settle_withdrawal(Decimal::new(1300_00, 2), false).unwrap();
        assert_eq!(w.balance, Decimal::new(5000_00, 2));
        assert_eq!(w.usable_balance, Decimal::new(5000_00, 2));
    }

    #[test]
    fn exact_decimal_arithmetic_survives_repeated_mutation() {
        let mut w = wallet(0, 0);
        for _ in 0..100 {
            w.credit_deposit(Decimal::new(10, 2), false);
        }
        assert_eq!(w.balance, Decimal::new(10_00, 2));
        assert_eq!(w.usable_balance, Decimal::new(10_00, 2));
    }
}
