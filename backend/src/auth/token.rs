//! HS256 bearer tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Token payload: `{user_id, is_admin, exp}` with `exp` in unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub is_admin: bool,
    pub exp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,
    #[error("Token signature does not match")]
    BadSignature,
    #[error("Token has expired")]
    Expired,
    #[error("Token signing algorithm is not accepted")]
    UnsupportedAlgorithm,
    #[error("No token signing secret configured")]
    Configuration,
    #[error("Token lifetime of {0} hours is out of range")]
    InvalidLifetime(u64),
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                TokenError::UnsupportedAlgorithm
            }
            _ => TokenError::Malformed,
        }
    }
}

/// Issues and verifies tokens signed with one symmetric secret.
///
/// Only HS256 is accepted on verification, whatever the token header claims.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_hours: u64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::Configuration);
        }

        let ttl = i64::try_from(ttl_hours)
            .ok()
            .and_then(Duration::try_hours)
            .ok_or(TokenError::InvalidLifetime(ttl_hours))?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: u64, is_admin: bool) -> Result<String, TokenError> {
        let claims = Claims {
            user_id,
            is_admin,
            exp: (Utc::now() + self.ttl).timestamp() as u64,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}
