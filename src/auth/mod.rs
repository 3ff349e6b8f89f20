use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SecurityConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    /// Claims for `user_id` expiring `expiry_hours` from now. Fails when the
    /// expiry cannot be represented as a timestamp.
    pub fn new(user_id: Uuid, expiry_hours: u64) -> Result<Self, JwtError> {
        let now = Utc::now();
        let exp = i64::try_from(expiry_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or(JwtError::InvalidExpiry(expiry_hours))?;

        Ok(Self {
            user_id,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        })
    }
}

#[derive(Debug)]
pub enum JwtError {
    TokenGeneration(String),
    InvalidToken(String),
    InvalidSecret,
    InvalidExpiry(u64),
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::TokenGeneration(msg) => write!(f, "JWT generation error: {}", msg),
            JwtError::InvalidToken(msg) => write!(f, "Invalid JWT token: {}", msg),
            JwtError::InvalidSecret => write!(f, "Invalid JWT secret"),
            JwtError::InvalidExpiry(hours) => write!(f, "Token lifetime of {} hours is out of range", hours),
        }
    }
}

impl std::error::Error for JwtError {}

/// Signing material and lifetime for issued tokens
#[derive(Clone)]
pub struct JwtSettings {
    secret: String,
    pub expiry_hours: u64,
}

impl JwtSettings {
    pub fn new(secret: impl Into<String>, expiry_hours: u64) -> Self {
        Self {
            secret: secret.into(),
            expiry_hours,
        }
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(security.jwt_secret.clone(), security.jwt_expiry_hours)
    }

    pub fn generate(&self, claims: &Claims) -> Result<String, JwtError> {
        if self.secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }

        let encoding_key = EncodingKey::from_secret(self.secret.as_bytes());
        encode(&Header::default(), claims, &encoding_key)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        if self.secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }

        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
            .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

        Ok(token_data.claims)
    }
}

impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("expiry_hours", &self.expiry_hours)
            .finish_non_exhaustive()
    }
}

/// Authorization predicate for gated operations. Receives the raw token
/// the caller presented, if any.
pub trait AccessGate: Send + Sync {
    fn is_authorized(&self, token: Option<&str>) -> bool;
}

/// Admits callers holding an unexpired token signed with our secret
#[derive(Debug, Clone)]
pub struct JwtAccessGate {
    settings: JwtSettings,
}

impl JwtAccessGate {
    pub fn new(settings: JwtSettings) -> Self {
        Self { settings }
    }
}

impl AccessGate for JwtAccessGate {
    fn is_authorized(&self, token: Option<&str>) -> bool {
        let Some(token) = token else {
            tracing::debug!("Access denied: no token presented");
            return false;
        };

        match self.settings.validate(token) {
            Ok(claims) => {
                tracing::debug!("Access granted for user {}", claims.user_id);
                true
            }
            Err(e) => {
                tracing::debug!("Access denied: {}", e);
                false
            }
        }
    }
}
