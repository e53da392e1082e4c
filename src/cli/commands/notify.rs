//! Single reminder sweep

use std::sync::Arc;

use crate::config::Config;
use crate::services::Scheduler;
use crate::state::SharedState;

pub async fn cmd_notify(config: Config) -> anyhow::Result<()> {
    let scheduler_config = config.scheduler.clone();
    let state = SharedState::new(config).await?;
    let scheduler = Scheduler::new(Arc::clone(&state.notifications), scheduler_config);

    let report = scheduler.run_once().await?;

    println!("Reminder sweep complete");
    println!("  Chat ids resolved: {}", report.chat_ids_resolved);
    println!("  Habits checked:    {}", report.habits_checked);
    println!("  Reminders sent:    {}", report.reminders_sent);
    println!("  Skipped (no chat): {}", report.reminders_skipped);

    Ok(())
}
