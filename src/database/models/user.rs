use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
    /// bcrypt hash; never leaves the server
    #[serde(skip_serializing, default)]
    pub password: String,
    pub avatar: String,
    #[serde(rename = "created")]
    #[sqlx(rename = "created")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub avatar: String,
}
