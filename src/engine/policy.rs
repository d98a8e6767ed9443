use rust_decimal::Decimal;

/// Amounts strictly above this settle as `PENDING` and wait for an operator
/// decision. Exactly 1000.00 is auto-approved.
pub const APPROVAL_THRESHOLD: Decimal = Decimal::from_parts(100000, 0, 0, false, 2);

pub fn requires_approval(amount: Decimal) -> bool {
    amount > APPROVAL_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_one_thousand() {
        assert_eq!(APPROVAL_THRESHOLD, Decimal::new(1000_00, 2));
    }

    #[test]
    fn exactly_at_threshold_auto_approves() {
        assert!(!requires_approval(Decimal::new(1000_00, 2)));
    }

    #[test]
    fn one_cent_above_threshold_requires_approval() {
        assert!(requires_approval(Decimal::new(1000_01, 2)));
    }

    #[test]
    fn small_amounts_auto_approve() {
        assert!(!requires_approval(Decimal::new(950_00, 2)));
        assert!(!requires_approval(Decimal::new(1, 2)));
    }
}
