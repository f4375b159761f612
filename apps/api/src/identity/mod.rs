//! Identity and onboarding flags.
//!
//! The identity proxy in front of this service authenticates the user and forwards
//! `x-user-sub`, `x-user-email` and `x-user-name`. No token is validated here; the
//! subject is only used to namespace per-user flags.

pub mod handlers;

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use redis::AsyncCommands;
use serde::Serialize;
use thiserror::Error;

use crate::errors::AppError;

pub const SUB_HEADER: &str = "x-user-sub";
pub const EMAIL_HEADER: &str = "x-user-email";
pub const NAME_HEADER: &str = "x-user-name";

// ────────────────────────────────────────────────────────────────────────────
// Identity extractor
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub sub: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl Identity {
    /// The subject, or `Unauthorized` when the request carries none.
    pub fn require_sub(&self) -> Result<&str, AppError> {
        self.sub.as_deref().ok_or(AppError::Unauthorized)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Ok(Identity {
            sub: header(SUB_HEADER),
            email: header(EMAIL_HEADER),
            name: header(NAME_HEADER),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Onboarding flags
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum OnboardingError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl From<OnboardingError> for AppError {
    fn from(e: OnboardingError) -> Self {
        AppError::Storage(e.to_string())
    }
}

/// Per-user "onboarding completed" flag.
#[async_trait]
pub trait OnboardingStore: Send + Sync {
    async fn is_completed(&self, sub: &str) -> Result<bool, OnboardingError>;
    async fn set_completed(&self, sub: &str, completed: bool) -> Result<(), OnboardingError>;
}

pub fn onboarding_key(sub: &str) -> String {
    format!("onboarding_completed:{sub}")
}

pub struct RedisOnboardingStore {
    client: redis::Client,
}

impl RedisOnboardingStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OnboardingStore for RedisOnboardingStore {
    async fn is_completed(&self, sub: &str) -> Result<bool, OnboardingError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(onboarding_key(sub)).await?;
        Ok(value.as_deref() == Some("true"))
    }

    async fn set_completed(&self, sub: &str, completed: bool) -> Result<(), OnboardingError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        if completed {
            conn.set::<_, _, ()>(onboarding_key(sub), "true").await?;
        } else {
            conn.del::<_, ()>(onboarding_key(sub)).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Identity {
        let (mut parts, _) = request.into_parts();
        Identity::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_identity_from_headers() {
        let request = Request::builder()
            .header(SUB_HEADER, "auth0|123")
            .header(EMAIL_HEADER, "jane@example.com")
            .body(())
            .unwrap();
        let identity = extract(request).await;

        assert_eq!(identity.require_sub().unwrap(), "auth0|123");
        assert_eq!(identity.email.as_deref(), Some("jane@example.com"));
        assert!(identity.name.is_none());
    }

    #[tokio::test]
    async fn test_missing_or_blank_sub_is_anonymous() {
        let request = Request::builder().header(SUB_HEADER, "  ").body(()).unwrap();
        let identity = extract(request).await;
        assert!(matches!(identity.require_sub(), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_onboarding_key_is_namespaced() {
        assert_eq!(onboarding_key("auth0|123"), "onboarding_completed:auth0|123");
    }
}
