//! Startup seed so a fresh database has something to log in with.

use crate::db::customers::CustomerRepository;
use crate::model::Role;
use crate::routes::auth::hash_password;

pub async fn seed_demo_customers(customers: &CustomerRepository) -> Result<(), String> {
    seed_customer(customers, "Emp", "Loyee", "employee@wallet", Role::Employee).await?;
    seed_customer(customers, "Alice", "Customer", "alice@wallet", Role::Customer).await?;
    Ok(())
}

async fn seed_customer(
    customers: &CustomerRepository,
    name: &str,
    surname: &str,
    username: &str,
    role: Role,
) -> Result<(), String> {
    let existing = customers
        .find_by_username(username)
        .await
        .map_err(|err| err.to_string())?;
    if existing.is_some() {
        return Ok(());
    }

    let password_hash = hash_password("password")?;
    customers
        .create(name, surname, username, &password_hash, role)
        .await
        .map_err(|err| err.to_string())?;
    tracing::info!("seeded demo customer: {username}");
    Ok(())
}
