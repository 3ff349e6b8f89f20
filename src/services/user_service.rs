use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;

use crate::api::input::{RegisterInput, ValidationError};
use crate::auth::{Claims, JwtError, JwtSettings};
use crate::database::models::{NewUser, User};
use crate::database::store::{StoreError, UserStore};

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("User already exists")]
    AlreadyExists,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error("Storage error: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for UserError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(_) => UserError::AlreadyExists,
            other => UserError::Storage(other),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Minimal user registration: hash, store, hand back a token
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    jwt: JwtSettings,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, jwt: JwtSettings, bcrypt_cost: u32) -> Self {
        Self { store, jwt, bcrypt_cost }
    }

    pub async fn list(&self) -> Result<Vec<User>, UserError> {
        Ok(self.store.find_all().await?)
    }

    pub async fn register(&self, input: RegisterInput) -> Result<TokenResponse, UserError> {
        if self.store.find_by_email(input.email()).await?.is_some() {
            return Err(UserError::AlreadyExists);
        }

        let password_hash = self.hash_password(input.password()).await?;
        let user = self
            .store
            .insert(NewUser {
                email: input.email().to_string(),
                password_hash,
                avatar: gravatar_url(input.email()),
            })
            .await?;

        info!("Registered user {}", user.id);

        let claims = Claims::new(user.id, self.jwt.expiry_hours)?;
        let token = self.jwt.generate(&claims)?;
        Ok(TokenResponse { token })
    }

    // bcrypt blocks; run it on the blocking pool
    async fn hash_password(&self, password: &str) -> Result<String, UserError> {
        let password = password.to_string();
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| UserError::Hashing(e.to_string()))?
            .map_err(|e| UserError::Hashing(e.to_string()))
    }
}

/// Gravatar URL for an email (200px, PG rating, mystery-person fallback)
pub fn gravatar_url(email: &str) -> String {
    let hash = Sha256::digest(email.trim().to_lowercase().as_bytes());
    format!("https://www.gravatar.com/avatar/{:x}?s=200&r=pg&d=mm", hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AccessGate, JwtAccessGate};
    use crate::database::memory::MemoryUserStore;

    fn service() -> (UserService, MemoryUserStore) {
        let store = MemoryUserStore::new();
        let svc = UserService::new(Arc::new(store.clone()), JwtSettings::new("test-secret", 1), 4);
        (svc, store)
    }

    fn input(email: &str) -> RegisterInput {
        RegisterInput::new(email, "secret123").unwrap()
    }

    #[tokio::test]
    async fn register_stores_hashed_password_and_issues_token() {
        let (svc, store) = service();
        let response = svc.register(input("ann@example.com")).await.unwrap();

        let gate = JwtAccessGate::new(JwtSettings::new("test-secret", 1));
        assert!(gate.is_authorized(Some(&response.token)));

        let user = store.find_by_email("ann@example.com").await.unwrap().unwrap();
        assert_ne!(user.password, "secret123");
        assert!(bcrypt::verify("secret123", &user.password).unwrap());
        assert_eq!(user.avatar, gravatar_url("ann@example.com"));
    }

    #[tokio::test]
    async fn register_rejects_existing_email() {
        let (svc, _) = service();
        svc.register(input("ann@example.com")).await.unwrap();

        let err = svc.register(input("ANN@example.com")).await.unwrap_err();
        assert!(matches!(err, UserError::AlreadyExists));
        assert_eq!(svc.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn listed_users_do_not_expose_password() {
        let (svc, _) = service();
        svc.register(input("bob@example.com")).await.unwrap();

        let users = svc.list().await.unwrap();
        let body = serde_json::to_value(&users).unwrap();
        assert_eq!(body[0]["email"], "bob@example.com");
        assert!(body[0].get("password").is_none());
    }

    #[tokio::test]
    async fn missing_secret_fails_token_issue() {
        let svc = UserService::new(Arc::new(MemoryUserStore::new()), JwtSettings::new("", 1), 4);
        let err = svc.register(input("cat@example.com")).await.unwrap_err();
        assert!(matches!(err, UserError::Token(JwtError::InvalidSecret)));
    }

    #[test]
    fn gravatar_url_is_case_insensitive() {
        let a = gravatar_url("Ann@Example.com ");
        let b = gravatar_url("ann@example.com");
        assert_eq!(a, b);
        assert!(a.starts_with("https://www.gravatar.com/avatar/"));
        assert!(a.ends_with("?s=200&r=pg&d=mm"));
    }
}
