//! Stateless session tokens.
//!
//! Every authenticated request carries an HS256 JWT holding the caller's
//! user id and role. The core trusts this pair unconditionally; it is the
//! only identity input to the authorization guard.

use anyhow::{anyhow, Context, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use super::UserRole;

const TOKEN_VALIDITY_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    pub role: UserRole,
    /// Expiry, unix seconds.
    pub exp: u64,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        TokenService {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(&self, user_id: i64, role: UserRole) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("System clock is before the unix epoch")?
            .as_secs();
        let claims = Claims {
            sub: user_id,
            role,
            exp: now + TOKEN_VALIDITY_SECS,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| anyhow!("Failed to sign token: {}", err))
    }

    /// Verifies signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|err| anyhow!("Invalid token: {}", err))
    }
}
