use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::errors::LedgerError;
use crate::core::models::UserRole;

// Matches the 30-day session lifetime of the original deployment.
const TOKEN_TTL_SECS: usize = 30 * 24 * 60 * 60;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,  // user id
    pub role: UserRole,
    pub exp: usize,
}

pub struct JwtService {
    secret: String,
}

impl JwtService {
    pub fn new(secret: String) -> Self {
        JwtService { secret }
    }

    pub fn generate_token(&self, user_id: &str, role: UserRole) -> Result<String, LedgerError> {
        let expiration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as usize + TOKEN_TTL_SECS)
            .map_err(|e| LedgerError::InternalServerError(format!("Time error: {}", e)))?;

        let claims = Claims {
            sub: user_id.to_string(),
            role,
            exp: expiration,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| LedgerError::InternalServerError(format!("JWT encoding error: {}", e)))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, LedgerError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| LedgerError::Unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

pub mod password {
    use crate::core::errors::LedgerError;

    pub fn hash(plain: &str) -> Result<String, LedgerError> {
        bcrypt::hash(plain, bcrypt::DEFAULT_COST)
            .map_err(|e| LedgerError::InternalServerError(format!("Hashing error: {}", e)))
    }

    pub fn verify(plain: &str, hashed: &str) -> Result<bool, LedgerError> {
        bcrypt::verify(plain, hashed)
            .map_err(|e| LedgerError::InternalServerError(format!("Hashing error: {}", e)))
    }
}
