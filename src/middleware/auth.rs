use std::convert::Infallible;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

/// Header browser clients send the session token in
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Raw token presented by the caller, if any. Whether it is any good is
/// for the `AccessGate` to decide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessToken(pub Option<String>);

impl AccessToken {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AccessToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(AccessToken(extract_token_from_headers(&parts.headers)))
    }
}

/// `x-auth-token: <jwt>` wins over `Authorization: Bearer <jwt>`
fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = headers
        .get(AUTH_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return Some(token.to_string());
    }

    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
