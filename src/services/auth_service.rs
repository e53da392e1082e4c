//! Domain service for token authentication.
//!
//! A token is the user's API key. It is handed out in exchange for valid
//! credentials and accepted by the HTTP layer as a bearer token.

use serde::Serialize;
use thiserror::Error;

use crate::db::User;
use crate::domain::UserId;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is disabled")]
    Inactive,

    #[error("User not found")]
    UserNotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Token issued for a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct TokenGrant {
    pub user_id: UserId,
    pub token: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Exchanges email and password for a token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails and
    /// [`AuthError::Inactive`] for disabled accounts.
    async fn obtain_token(&self, email: &str, password: &str) -> Result<TokenGrant, AuthError>;

    /// Resolves a token to an active user.
    async fn verify_token(&self, token: &str) -> Result<Option<User>, AuthError>;

    /// Replaces the user's token and returns the new one.
    async fn regenerate_token(&self, user_id: UserId) -> Result<String, AuthError>;
}
