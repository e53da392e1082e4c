//! Telegram Bot API client.
//!
//! Only the two calls the reminder sweep needs: `getUpdates` to learn which
//! chat belongs to which username, and `sendMessage`.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::TelegramConfig;

/// A chat seen in the pending updates batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundChat {
    pub username: Option<String>,
    pub chat_id: i64,
}

/// Outbound messaging used by the notification sweep.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Chats from the pending inbound messages, in arrival order.
    async fn fetch_chats(&self) -> Result<Vec<InboundChat>>;

    /// Sends `text` to `chat_id`. Errors only on transport failure.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct BotResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Update {
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(u64::from(
                config.request_timeout_seconds.max(1),
            )))
            .user_agent("Habitrack/1.0")
            .build()
            .context("Failed to build Telegram HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.bot_token.clone(),
        })
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.token.is_empty()
    }

    fn method_url(&self, method: &str) -> Result<Url> {
        Url::parse(&format!("{}/bot{}/{method}", self.base_url, self.token))
            .context("Invalid Telegram API URL")
    }
}

#[async_trait]
impl ChatGateway for TelegramClient {
    async fn fetch_chats(&self) -> Result<Vec<InboundChat>> {
        let url = self.method_url("getUpdates")?;

        let response: BotResponse<Vec<Update>> = self
            .client
            .get(url)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("getUpdates request failed")?
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .context("getUpdates returned malformed JSON")?;

        if !response.ok {
            bail!(
                "getUpdates rejected: {}",
                response.description.unwrap_or_default()
            );
        }

        let chats: Vec<InboundChat> = response
            .result
            .unwrap_or_default()
            .into_iter()
            .filter_map(|update| update.message)
            .map(|message| InboundChat {
                username: message.chat.username,
                chat_id: message.chat.id,
            })
            .collect();

        debug!("Fetched {} chats from Telegram updates", chats.len());
        Ok(chats)
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let url = self.method_url("sendMessage")?;

        let response = self
            .client
            .get(url)
            .query(&[("chat_id", chat_id.to_string().as_str()), ("text", text)])
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("sendMessage request failed")?;

        let status = response.status();
        if !status.is_success() {
            warn!(chat_id, status = %status, "Telegram did not accept reminder");
        }

        Ok(())
    }
}
