pub mod customers;
pub mod idempotency;
pub mod ledger;
