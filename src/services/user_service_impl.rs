//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::Config;
use crate::db::{NewUser, Store, User, UserChanges};
use crate::domain::{UserId, canonical_email};
use crate::services::user_service::{Registration, UserError, UserPatch, UserService};

pub struct SeaOrmUserService {
    store: Store,
    config: Arc<RwLock<Config>>,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, config: Arc<RwLock<Config>>) -> Self {
        Self { store, config }
    }

    async fn create(&self, registration: Registration, is_staff: bool) -> Result<User, UserError> {
        let security = self.config.read().await.security.clone();

        let email = normalize_email(&registration.email)?;
        check_password(&registration.password, security.min_password_length)?;
        let tg_username = normalize_tg_username(&registration.tg_username)?;

        if self.store.get_user_by_email(&email).await?.is_some() {
            return Err(UserError::Conflict(format!(
                "A user with email {email} already exists"
            )));
        }

        let user = self
            .store
            .create_user(
                NewUser {
                    email,
                    password: registration.password,
                    tg_username,
                    first_name: non_blank(registration.first_name),
                    last_name: non_blank(registration.last_name),
                    is_staff,
                },
                &security,
            )
            .await?;

        info!(user_id = %user.id, is_staff, "Registered user");
        Ok(user)
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn register(&self, registration: Registration) -> Result<User, UserError> {
        self.create(registration, false).await
    }

    async fn create_staff(
        &self,
        email: &str,
        password: &str,
        tg_username: &str,
    ) -> Result<User, UserError> {
        self.create(
            Registration {
                email: email.to_string(),
                password: password.to_string(),
                tg_username: tg_username.to_string(),
                first_name: None,
                last_name: None,
            },
            true,
        )
        .await
    }

    async fn list(&self, caller: &User) -> Result<Vec<User>, UserError> {
        if !caller.is_staff {
            return Err(UserError::Forbidden);
        }
        Ok(self.store.list_users().await?)
    }

    async fn get(&self, caller: &User, id: UserId) -> Result<User, UserError> {
        if caller.id != id && !caller.is_staff {
            return Err(UserError::Forbidden);
        }

        self.store
            .get_user(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    async fn update(&self, caller: &User, id: UserId, patch: UserPatch) -> Result<User, UserError> {
        if caller.id != id {
            return Err(UserError::Forbidden);
        }

        let security = self.config.read().await.security.clone();

        let email = match patch.email {
            Some(raw) => {
                let email = normalize_email(&raw)?;
                if let Some(existing) = self.store.get_user_by_email(&email).await?
                    && existing.id != id
                {
                    return Err(UserError::Conflict(format!(
                        "A user with email {email} already exists"
                    )));
                }
                Some(email)
            }
            None => None,
        };

        if let Some(password) = &patch.password {
            check_password(password, security.min_password_length)?;
        }

        let tg_username = patch
            .tg_username
            .as_deref()
            .map(normalize_tg_username)
            .transpose()?;

        let changes = UserChanges {
            email,
            password: patch.password,
            tg_username,
            first_name: patch.first_name.map(non_blank),
            last_name: patch.last_name.map(non_blank),
        };

        self.store
            .update_user(id, changes, &security)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    async fn delete(&self, caller: &User, id: UserId) -> Result<(), UserError> {
        if caller.id != id {
            return Err(UserError::Forbidden);
        }

        if !self.store.delete_user(id).await? {
            return Err(UserError::NotFound(id));
        }

        info!(user_id = %id, "Deleted user");
        Ok(())
    }
}

fn normalize_email(raw: &str) -> Result<String, UserError> {
    let email = canonical_email(raw);

    let valid = email.len() <= 254
        && !email.chars().any(char::is_whitespace)
        && email.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        });

    if valid {
        Ok(email)
    } else {
        Err(UserError::Validation(format!(
            "Enter a valid email address: {email}"
        )))
    }
}

fn check_password(password: &str, min_length: usize) -> Result<(), UserError> {
    if password.chars().count() < min_length {
        return Err(UserError::Validation(format!(
            "Password must be at least {min_length} characters"
        )));
    }
    Ok(())
}

fn normalize_tg_username(raw: &str) -> Result<String, UserError> {
    let name = raw.trim();
    let name = name.strip_prefix('@').unwrap_or(name);

    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(UserError::Validation(
            "Telegram username must be a single non-empty word".to_string(),
        ));
    }
    Ok(name.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
