use sqlx::PgPool;
use uuid::Uuid;

use crate::model::{Customer, Role};

// Database repository
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        name: &str,
        surname: &str,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<Customer, sqlx::Error> {
        let customer = Customer {
            id: Uuid::new_v4(),
            name: name.to_string(),
            surname: surname.to_string(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            role,
        };
        sqlx::query(
            "INSERT INTO customers (id, name, surname, username, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.surname)
        .bind(&customer.username)
        .bind(&customer.password_hash)
        .bind(customer.role)
        .execute(&self.pool)
        .await?;
        Ok(customer)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Customer>, sqlx::Error> {
        sqlx::query_as::<_, Customer>(
            "SELECT id, name, surname, username, password_hash, role \
             FROM customers WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, sqlx::Error> {
        sqlx::query_as::<_, Customer>(
            "SELECT id, name, surname, username, password_hash, role \
             FROM customers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }
}
