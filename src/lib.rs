pub mod bootstrap;
pub mod db;
pub mod engine;
pub mod model;
pub mod routes;

pub use engine::{EngineError, Ledger};
