use std::sync::Arc;
use std::time::Duration;

use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_email::Email;
use uuid::Uuid;

use crate::db::customers::CustomerRepository;
use crate::model::{Customer, Role};

use super::utils::{self, ApiError};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // customer id
    pub role: Role, // drives employee-only endpoints
    pub exp: i64,   // expiration timestamp
    pub iat: i64,   // issued at timestamp
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    username: Email,
    password: String,
    name: String,
    surname: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    token: String,
    customer_id: Uuid,
}

pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_err| "unable to hash password".to_string())
}

// Authentication service
pub struct AuthService {
    pub repo: CustomerRepository,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(repo: CustomerRepository, jwt_secret: String) -> Self {
        Self { repo, jwt_secret }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, ApiError> {
        // Check if the username is taken
        let existing = self
            .repo
            .find_by_username(req.username.as_str())
            .await
            .map_err(storage_error)?;
        if existing.is_some() {
            return Err(ApiError::new(
                StatusCode::BAD_REQUEST,
                "Customer already exists",
            ));
        }

        //check for password validity
        utils::check_password(&req.password)?;

        let password_hash = hash_password(&req.password)
            .map_err(|msg| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, msg))?;

        // Self-registration always creates a CUSTOMER; employees are provisioned out of band
        let customer = self
            .repo
            .create(
                &req.name,
                &req.surname,
                req.username.as_str(),
                &password_hash,
                Role::Customer,
            )
            .await
            .map_err(storage_error)?;
        tracing::info!("customer created with username: {}", customer.username);

        let token = self.generate_token(&customer)?;
        Ok(AuthResponse {
            token,
            customer_id: customer.id,
        })
    }

    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, ApiError> {
        tracing::info!("Attempting to log in customer: {}", req.username);

        let customer = self
            .repo
            .find_by_username(&req.username)
            .await
            .map_err(storage_error)?
            .ok_or_else(invalid_credentials)?;

        // Verify password
        let parsed_hash =
            PasswordHash::new(&customer.password_hash).map_err(|_err| invalid_credentials())?;
        if Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .is_err()
        {
            tracing::warn!("Invalid credentials for customer: {}", req.username);
            return Err(invalid_credentials());
        }

        let token = self.generate_token(&customer)?;
        tracing::info!("Generated token for customer: {}", req.username);

        Ok(AuthResponse {
            token,
            customer_id: customer.id,
        })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = jsonwebtoken::Validation::default();

        validation.leeway = 10;
        validation.validate_exp = true;
        validation.algorithms = vec![jsonwebtoken::Algorithm::HS256];

        let token_data = jsonwebtoken::decode::<Claims>(
            token,
            &jsonwebtoken::DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|err| {
            tracing::error!("Error decoding token: {:?}", err);
            ApiError::new(StatusCode::UNAUTHORIZED, "Invalid token")
        })?;

        Ok(token_data.claims)
    }

    fn generate_token(&self, customer: &Customer) -> Result<String, ApiError> {
        let now = Utc::now();

        // Access token (15 minutes)
        let claims = Claims {
            sub: customer.id,
            role: customer.role,
            exp: (now + Duration::from_secs(15 * 60)).timestamp(),
            iat: now.timestamp(),
        };

        jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|_err| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "unable to issue token"))
    }
}

fn invalid_credentials() -> ApiError {
    ApiError::new(StatusCode::UNAUTHORIZED, "Invalid credentials")
}

fn storage_error(err: sqlx::Error) -> ApiError {
    tracing::error!("Customer storage error: {err}");
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

// Route for handling new customer registration
pub async fn register_handler(
    State(service): State<Arc<AuthService>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = service.register(req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

// Route for handling customer login
pub async fn login_handler(
    State(service): State<Arc<AuthService>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = service.login(req).await?;
    Ok((StatusCode::OK, Json(response)))
}

pub fn auth_routes(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .with_state(service)
}
