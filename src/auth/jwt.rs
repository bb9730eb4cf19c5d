//! JWT session tokens
//!
//! Tokens are signed with HS256 and identify the partner by store id, role
//! and linkage key.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::hierarchy::Role;
use crate::types::CrmError;

/// Minimum accepted secret length
const MIN_SECRET_LEN: usize = 32;

/// Payload stored in a session token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Partner store id
    pub sub: String,
    pub role: Role,
    /// `universeFundId` or `uniqueId`
    pub linkage_key: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Input for creating a new token
#[derive(Debug, Clone)]
pub struct TokenInput {
    pub partner_id: String,
    pub role: Role,
    pub linkage_key: String,
}

/// JWT validator and generator
#[derive(Clone)]
pub struct JwtValidator {
    secret: String,
    expiry_seconds: u64,
}

impl JwtValidator {
    /// Create a new validator; the secret must be at least 32 characters
    pub fn new(secret: String, expiry_seconds: u64) -> Result<Self, CrmError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(CrmError::Config(format!(
                "JWT_SECRET must be at least {MIN_SECRET_LEN} characters"
            )));
        }

        Ok(Self {
            secret,
            expiry_seconds,
        })
    }

    /// Create a validator for dev mode
    pub fn new_dev() -> Self {
        Self {
            secret: "dev-mode-secret-not-for-production-use-123456".into(),
            expiry_seconds: 3600,
        }
    }

    pub fn expiry_seconds(&self) -> u64 {
        self.expiry_seconds
    }

    /// Generate a token; returns the token and its expiry timestamp
    pub fn generate_token(&self, input: TokenInput) -> Result<(String, u64), CrmError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| CrmError::Auth(format!("System time error: {}", e)))?
            .as_secs();

        let claims = Claims {
            sub: input.partner_id,
            role: input.role,
            linkage_key: input.linkage_key,
            iat: now,
            exp: now + self.expiry_seconds,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| CrmError::Auth(format!("Failed to generate token: {}", e)))?;

        Ok((token, claims.exp))
    }

    /// Verify and decode a token
    pub fn verify_token(&self, token: &str) -> Result<Claims, CrmError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(CrmError::from)
    }
}

/// Extract token from an Authorization header ("Bearer <token>")
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    let token = auth_header?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
