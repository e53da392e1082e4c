//! Domain service for user accounts.
//!
//! Registration is open; every other operation acts on behalf of a caller and
//! is limited to the caller's own account, except that staff may read and list
//! everyone.

use serde::Deserialize;
use thiserror::Error;

use crate::db::User;
use crate::domain::UserId;
use crate::services::habit_service::present;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User {0} not found")]
    NotFound(UserId),

    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub tg_username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Partial account update. Absent fields keep their value; a `null` or blank
/// name clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub tg_username: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub last_name: Option<Option<String>>,
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Creates a regular account.
    ///
    /// # Errors
    ///
    /// [`UserError::Conflict`] when the email is taken,
    /// [`UserError::Validation`] for malformed input.
    async fn register(&self, registration: Registration) -> Result<User, UserError>;

    /// Creates an account with staff rights.
    async fn create_staff(
        &self,
        email: &str,
        password: &str,
        tg_username: &str,
    ) -> Result<User, UserError>;

    /// Lists every account. Staff only.
    async fn list(&self, caller: &User) -> Result<Vec<User>, UserError>;

    async fn get(&self, caller: &User, id: UserId) -> Result<User, UserError>;

    async fn update(&self, caller: &User, id: UserId, patch: UserPatch) -> Result<User, UserError>;

    /// Deletes the account together with its habits.
    async fn delete(&self, caller: &User, id: UserId) -> Result<(), UserError>;
}
