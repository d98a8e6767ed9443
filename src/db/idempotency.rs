//! Postgres-backed idempotency guard.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::engine::{EngineError, IdempotencyGuard, Reservation};

/// Reserves (key, endpoint) pairs through the unique constraint on
/// `idempotent_requests`. A lost insert race is indistinguishable from a
/// replay, which is exactly the behavior we want.
pub struct PgIdempotencyGuard {
    pool: PgPool,
}

impl PgIdempotencyGuard {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdempotencyGuard for PgIdempotencyGuard {
    async fn check_and_reserve(
        &self,
        key: &str,
        endpoint: &str,
    ) -> Result<Reservation, EngineError> {
        let inserted = sqlx::query(
            "INSERT INTO idempotent_requests (id, idempotency_key, endpoint, created_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (idempotency_key, endpoint) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(key)
        .bind(endpoint)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() == 0 {
            Ok(Reservation::Duplicate)
        } else {
            Ok(Reservation::Fresh)
        }
    }
}
