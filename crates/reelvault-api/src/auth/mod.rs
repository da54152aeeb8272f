//! Bearer token authentication
//!
//! Every upload route sits behind `auth_middleware`. Tokens are issued by the
//! account service; this service only verifies them and resolves the caller's
//! user id. Verification happens before any multipart body is read.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use reelvault_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// JWT claims carried by access tokens. `sub` is the user id.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// The authenticated caller, inserted into request extensions by
/// `auth_middleware`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal(pub Uuid);

/// Credential verification seam. The production implementation verifies JWTs;
/// tests can substitute a stub.
pub trait CredentialValidator: Send + Sync {
    /// Verify the bearer token and return the authenticated user id.
    fn validate(&self, token: &str) -> Result<Uuid, AppError>;
}

/// HS256 JWT validator.
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl CredentialValidator for JwtValidator {
    fn validate(&self, token: &str) -> Result<Uuid, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Token has expired".to_string())
                }
                _ => AppError::Unauthorized("Invalid bearer token".to_string()),
            }
        })?;

        Uuid::parse_str(&data.claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid bearer token".to_string()))
    }
}

/// Mint an HS256 token for `user_id`. Used by local tooling and tests; the
/// account service issues tokens in production.
pub fn issue_token(secret: &str, user_id: Uuid, ttl: Duration) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Invalid authorization header format".to_string())
    })
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match extract_bearer(request.headers()) {
        Ok(token) => token,
        Err(e) => return HttpAppError(e).into_response(),
    };

    match state.credentials.validate(token) {
        Ok(user_id) => {
            request.extensions_mut().insert(Principal(user_id));
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}
