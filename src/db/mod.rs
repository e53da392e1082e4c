use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::domain::{HabitDraft, HabitId, UserId};

pub mod migrator;
pub mod repositories;

pub use repositories::habit::{Habit, HabitPage};
pub use repositories::user::{NewUser, User, UserChanges};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn habit_repo(&self) -> repositories::habit::HabitRepository {
        repositories::habit::HabitRepository::new(self.conn.clone())
    }

    // Users

    pub async fn create_user(&self, new_user: NewUser, security: &SecurityConfig) -> Result<User> {
        self.user_repo().create(new_user, security).await
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list_all().await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.user_repo().verify_api_key(api_key).await
    }

    pub async fn regenerate_user_api_key(&self, id: UserId) -> Result<String> {
        self.user_repo().regenerate_api_key(id).await
    }

    pub async fn update_user(
        &self,
        id: UserId,
        changes: UserChanges,
        security: &SecurityConfig,
    ) -> Result<Option<User>> {
        self.user_repo().update(id, changes, security).await
    }

    pub async fn set_user_chat_id(&self, id: UserId, chat_id: i64) -> Result<bool> {
        self.user_repo().set_chat_id_if_absent(id, chat_id).await
    }

    pub async fn delete_user(&self, id: UserId) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    // Habits

    pub async fn add_habit(&self, owner: UserId, draft: &HabitDraft) -> Result<Habit> {
        self.habit_repo().insert(owner, draft).await
    }

    pub async fn get_habit(&self, id: HabitId) -> Result<Option<Habit>> {
        self.habit_repo().get(id).await
    }

    pub async fn list_habits_for_owner(
        &self,
        owner: UserId,
        page: u64,
        page_size: u64,
    ) -> Result<HabitPage> {
        self.habit_repo()
            .list_for_owner(owner, page, page_size)
            .await
    }

    pub async fn list_public_habits(&self) -> Result<Vec<Habit>> {
        self.habit_repo().list_public().await
    }

    pub async fn list_all_habits(&self) -> Result<Vec<Habit>> {
        self.habit_repo().list_all().await
    }

    pub async fn count_habits_linking_to(&self, id: HabitId) -> Result<u64> {
        self.habit_repo().count_linking_to(id).await
    }

    pub async fn update_habit(&self, id: HabitId, draft: &HabitDraft) -> Result<Option<Habit>> {
        self.habit_repo().update(id, draft).await
    }

    pub async fn record_habit_dispatch(&self, id: HabitId, at: DateTime<Utc>) -> Result<()> {
        self.habit_repo().record_dispatch(id, at).await
    }

    pub async fn remove_habit(&self, id: HabitId) -> Result<bool> {
        self.habit_repo().delete(id).await
    }
}
