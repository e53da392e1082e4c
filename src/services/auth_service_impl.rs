//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{Store, User};
use crate::domain::{UserId, canonical_email};
use crate::services::auth_service::{AuthError, AuthService, TokenGrant};

pub struct SeaOrmAuthService {
    store: Store,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn obtain_token(&self, email: &str, password: &str) -> Result<TokenGrant, AuthError> {
        let user = self
            .store
            .verify_user_password(&canonical_email(email), password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AuthError::Inactive);
        }

        info!(user_id = %user.id, "Issued token");

        Ok(TokenGrant {
            user_id: user.id,
            token: user.api_key,
        })
    }

    async fn verify_token(&self, token: &str) -> Result<Option<User>, AuthError> {
        if token.is_empty() {
            return Ok(None);
        }

        let user = self.store.verify_api_key(token).await?;
        Ok(user.filter(|u| u.is_active))
    }

    async fn regenerate_token(&self, user_id: UserId) -> Result<String, AuthError> {
        if self.store.get_user(user_id).await?.is_none() {
            return Err(AuthError::UserNotFound);
        }

        let token = self.store.regenerate_user_api_key(user_id).await?;
        info!(user_id = %user_id, "Regenerated token");
        Ok(token)
    }
}
