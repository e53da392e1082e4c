//! Reminder sweep.
//!
//! One sweep learns Telegram chat ids for users that have written to the bot,
//! then sends a reminder for every habit that is due and stamps its dispatch
//! time.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::clients::telegram::ChatGateway;
use crate::config::Config;
use crate::db::{Habit, Store, User};
use crate::domain::schedule::{DispatchSchedule, Reminder, offset_from_minutes};
use crate::domain::{HabitId, UserId};

/// Counters for a single sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub chat_ids_resolved: u64,
    pub habits_checked: u64,
    pub reminders_sent: u64,
    /// Due habits whose owner has no chat id yet.
    pub reminders_skipped: u64,
}

pub struct NotificationService {
    store: Store,
    gateway: Arc<dyn ChatGateway>,
    config: Arc<RwLock<Config>>,
}

impl NotificationService {
    #[must_use]
    pub fn new(store: Store, gateway: Arc<dyn ChatGateway>, config: Arc<RwLock<Config>>) -> Self {
        Self {
            store,
            gateway,
            config,
        }
    }

    /// Runs chat id resolution and then the dispatch pass.
    ///
    /// # Errors
    ///
    /// A failed Telegram call or database write aborts the sweep. Habits
    /// handled before the failure keep their new dispatch time.
    pub async fn run_sweep(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let mut report = SweepReport {
            chat_ids_resolved: self.resolve_chat_ids().await?,
            ..SweepReport::default()
        };

        self.dispatch_due(now, &mut report).await?;

        info!(
            chat_ids_resolved = report.chat_ids_resolved,
            habits_checked = report.habits_checked,
            reminders_sent = report.reminders_sent,
            reminders_skipped = report.reminders_skipped,
            "Reminder sweep complete"
        );

        Ok(report)
    }

    async fn resolve_chat_ids(&self) -> Result<u64> {
        let chats = self.gateway.fetch_chats().await?;

        // Later updates win.
        let by_username: HashMap<String, i64> = chats
            .into_iter()
            .filter_map(|chat| Some((chat.username?.to_lowercase(), chat.chat_id)))
            .collect();

        if by_username.is_empty() {
            return Ok(0);
        }

        let users = self.store.list_users().await?;
        let mut taken: HashSet<i64> = users.iter().filter_map(|u| u.tg_chat_id).collect();
        let mut resolved = 0;

        for user in users.iter().filter(|u| u.tg_chat_id.is_none()) {
            let Some(&chat_id) = by_username.get(&user.tg_username.to_lowercase()) else {
                continue;
            };

            if taken.contains(&chat_id) {
                warn!(
                    user_id = %user.id,
                    chat_id,
                    "Chat id already belongs to another user, not assigning"
                );
                continue;
            }

            if self.store.set_user_chat_id(user.id, chat_id).await? {
                taken.insert(chat_id);
                resolved += 1;
                metrics::counter!("chat_ids_resolved_total").increment(1);
                info!(user_id = %user.id, chat_id, "Resolved Telegram chat id");
            }
        }

        Ok(resolved)
    }

    async fn dispatch_due(&self, now: DateTime<Utc>, report: &mut SweepReport) -> Result<()> {
        let offset = offset_from_minutes(self.config.read().await.notifications.utc_offset_minutes);

        let owners: HashMap<UserId, User> = self
            .store
            .list_users()
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();
        let habits = self.store.list_all_habits().await?;
        let actions: HashMap<HabitId, String> =
            habits.iter().map(|h| (h.id, h.action.clone())).collect();

        for habit in &habits {
            report.habits_checked += 1;

            let schedule = DispatchSchedule {
                time: habit.time,
                period_days: habit.period,
                last_dispatch_time: habit.last_dispatch_time,
            };
            if !schedule.is_due(now, offset) {
                continue;
            }

            let chat_id = owners.get(&habit.owner_id).and_then(|u| u.tg_chat_id);
            match chat_id {
                Some(chat_id) => {
                    let text = reminder_for(habit, &actions).compose();
                    self.gateway.send_message(chat_id, &text).await?;
                    report.reminders_sent += 1;
                    metrics::counter!("reminders_sent_total").increment(1);
                    debug!(habit_id = %habit.id, chat_id, "Sent reminder");
                }
                None => {
                    report.reminders_skipped += 1;
                    debug!(
                        habit_id = %habit.id,
                        user_id = %habit.owner_id,
                        "Owner has no chat id, reminder dropped"
                    );
                }
            }

            self.store.record_habit_dispatch(habit.id, now).await?;
        }

        Ok(())
    }
}

fn reminder_for<'a>(habit: &'a Habit, actions: &'a HashMap<HabitId, String>) -> Reminder<'a> {
    Reminder {
        action: &habit.action,
        time: habit.time,
        place: &habit.place,
        length_seconds: habit.length,
        reward: habit.reward.as_deref(),
        linked_action: habit
            .linked_id
            .and_then(|id| actions.get(&id))
            .map(String::as_str),
    }
}
