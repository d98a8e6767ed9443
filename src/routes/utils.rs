use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;

use crate::engine::EngineError;
use crate::model::Role;

use super::auth::{AuthService, Claims};

/// Error rendered to API clients: status code plus a JSON body carrying
/// timestamp, status, reason phrase and message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let status = match &err {
            EngineError::WalletNotFound(_)
            | EngineError::TransactionNotFound(_)
            | EngineError::CustomerNotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::NotActiveForShopping
            | EngineError::NotActiveForWithdraw
            | EngineError::InsufficientFunds { .. }
            | EngineError::AlreadyFinalized(_)
            | EngineError::DuplicateRequest
            | EngineError::ConcurrentModification => StatusCode::CONFLICT,
            EngineError::Inconsistent(_) | EngineError::Storage(_) => {
                tracing::error!("Internal error: {err}");
                return ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
            }
        };
        ApiError::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "status": self.status.as_u16(),
            "error": self.status.canonical_reason().unwrap_or("Error"),
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

#[inline]
pub fn validate_auth_token(headers: &HeaderMap, service: &AuthService) -> Result<Claims, ApiError> {
    let jwt_header_token = match headers.get("Authorization").map(|token| token.to_str()) {
        Some(Ok(token)) => token.strip_prefix("Bearer ").unwrap_or(token),
        _ => {
            return Err(ApiError::new(StatusCode::UNAUTHORIZED, "Invalid token"));
        }
    };
    //validate our token
    match service.verify_token(jwt_header_token) {
        Ok(claims) => Ok(claims),
        Err(_) => Err(ApiError::new(StatusCode::UNAUTHORIZED, "Invalid token")),
    }
}

#[inline]
pub fn require_employee(claims: &Claims) -> Result<(), ApiError> {
    if claims.role != Role::Employee {
        tracing::warn!(customer = %claims.sub, "employee-only operation rejected");
        return Err(ApiError::new(StatusCode::FORBIDDEN, "Employee role required"));
    }
    Ok(())
}

#[inline]
pub fn check_password(password: &str) -> Result<(), ApiError> {
    let fail = |msg: &str| Err(ApiError::new(StatusCode::BAD_REQUEST, msg));
    if password.len() < 8 {
        return fail("Password must be at least 8 characters");
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return fail("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return fail("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_digit(10)) {
        return fail("Password must contain at least one digit");
    }
    if !password.chars().any(|c| !c.is_alphanumeric()) {
        return fail("Password must contain at least one special character");
    }
    Ok(())
}
