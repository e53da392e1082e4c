//! Staff account bootstrap

use anyhow::Context;

use crate::config::Config;
use crate::state::SharedState;

pub async fn cmd_create_staff(
    config: Config,
    email: &str,
    password: &str,
    tg_username: &str,
) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;

    let user = state
        .user_service
        .create_staff(email, password, tg_username)
        .await
        .context("Failed to create staff user")?;

    println!("✓ Staff user {} created (id {})", user.email, user.id);
    println!("  API token: {}", user.api_key);

    Ok(())
}
