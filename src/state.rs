use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use crate::clients::telegram::{ChatGateway, TelegramClient};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, HabitService, NotificationService, SeaOrmAuthService, SeaOrmHabitService,
    SeaOrmUserService, UserService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub user_service: Arc<dyn UserService>,

    pub habit_service: Arc<dyn HabitService>,

    pub notifications: Arc<NotificationService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let telegram = TelegramClient::new(&config.telegram)?;
        if !telegram.is_configured() {
            warn!("Telegram bot token is not set; reminders cannot be delivered");
        }
        Self::with_gateway(config, Arc::new(telegram)).await
    }

    /// Builds the state around an explicit chat gateway.
    pub async fn with_gateway(
        config: Config,
        gateway: Arc<dyn ChatGateway>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let config = Arc::new(RwLock::new(config));

        let auth_service = Arc::new(SeaOrmAuthService::new(store.clone())) as Arc<dyn AuthService>;
        let user_service = Arc::new(SeaOrmUserService::new(store.clone(), config.clone()))
            as Arc<dyn UserService>;
        let habit_service =
            Arc::new(SeaOrmHabitService::new(store.clone())) as Arc<dyn HabitService>;
        let notifications = Arc::new(NotificationService::new(
            store.clone(),
            gateway,
            config.clone(),
        ));

        Ok(Self {
            config,
            store,
            auth_service,
            user_service,
            habit_service,
            notifications,
        })
    }
}
