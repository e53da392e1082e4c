//! `SeaORM` implementation of the `HabitService` trait.

use async_trait::async_trait;
use chrono::NaiveTime;
use tracing::{debug, info};

use crate::db::{Habit, HabitPage, Store, User};
use crate::domain::{HabitDraft, HabitId, LinkedHabit, rules};
use crate::services::habit_service::{HabitError, HabitPatch, HabitPayload, HabitService};

const MAX_PLACE_CHARS: usize = 100;
const MAX_ACTION_CHARS: usize = 150;
const MAX_REWARD_CHARS: usize = 100;

/// Stored values overlaid with a request, before the linked habit is looked up.
#[derive(Debug, Clone)]
struct Proposed {
    place: String,
    time: NaiveTime,
    action: String,
    is_pleasant: bool,
    linked: Option<HabitId>,
    period: i32,
    reward: Option<String>,
    length: i32,
    is_public: bool,
}

impl Proposed {
    fn from_payload(p: HabitPayload) -> Self {
        Self {
            place: p.place,
            time: p.time,
            action: p.action,
            is_pleasant: p.is_pleasant,
            linked: p.linked,
            period: p.period,
            reward: p.reward,
            length: p.length,
            is_public: p.is_public,
        }
    }

    fn from_habit(h: &Habit) -> Self {
        Self {
            place: h.place.clone(),
            time: h.time,
            action: h.action.clone(),
            is_pleasant: h.is_pleasant,
            linked: h.linked_id,
            period: h.period,
            reward: h.reward.clone(),
            length: h.length,
            is_public: h.is_public,
        }
    }

    fn apply(mut self, patch: HabitPatch) -> Self {
        if let Some(place) = patch.place {
            self.place = place;
        }
        if let Some(time) = patch.time {
            self.time = time;
        }
        if let Some(action) = patch.action {
            self.action = action;
        }
        if let Some(is_pleasant) = patch.is_pleasant {
            self.is_pleasant = is_pleasant;
        }
        if let Some(linked) = patch.linked {
            self.linked = linked;
        }
        if let Some(period) = patch.period {
            self.period = period;
        }
        if let Some(reward) = patch.reward {
            self.reward = reward;
        }
        if let Some(length) = patch.length {
            self.length = length;
        }
        if let Some(is_public) = patch.is_public {
            self.is_public = is_public;
        }
        self
    }

    fn check_fields(&self) -> Result<(), HabitError> {
        check_text("place", &self.place, MAX_PLACE_CHARS)?;
        check_text("action", &self.action, MAX_ACTION_CHARS)?;

        if let Some(reward) = &self.reward
            && reward.chars().count() > MAX_REWARD_CHARS
        {
            return Err(HabitError::Validation(format!(
                "reward must not exceed {MAX_REWARD_CHARS} characters"
            )));
        }

        if self.length < 0 {
            return Err(HabitError::Validation(
                "execution time cannot be negative".to_string(),
            ));
        }

        Ok(())
    }
}

fn check_text(field: &str, value: &str, max: usize) -> Result<(), HabitError> {
    if value.trim().is_empty() {
        return Err(HabitError::Validation(format!("{field} may not be blank")));
    }
    if value.chars().count() > max {
        return Err(HabitError::Validation(format!(
            "{field} must not exceed {max} characters"
        )));
    }
    Ok(())
}

pub struct SeaOrmHabitService {
    store: Store,
}

impl SeaOrmHabitService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Loads a habit the caller owns.
    async fn owned(&self, caller: &User, id: HabitId) -> Result<Habit, HabitError> {
        let habit = self
            .store
            .get_habit(id)
            .await?
            .ok_or(HabitError::NotFound(id))?;

        if habit.owner_id != caller.id {
            debug!(habit_id = %id, user_id = %caller.id, "Rejected access to foreign habit");
            return Err(HabitError::Forbidden);
        }

        Ok(habit)
    }

    /// Field checks, linked lookup and the rule set. `this` is the id of the
    /// habit being changed, if it already exists. Only the caller's own habits
    /// can be linked; anything else is reported as missing.
    async fn draft(
        &self,
        caller: &User,
        this: Option<HabitId>,
        proposed: Proposed,
    ) -> Result<HabitDraft, HabitError> {
        proposed.check_fields()?;

        let linked = match proposed.linked {
            Some(linked_id) if Some(linked_id) == this => {
                return Err(HabitError::Validation(
                    "a habit cannot be linked to itself".to_string(),
                ));
            }
            Some(linked_id) => {
                let target = self
                    .store
                    .get_habit(linked_id)
                    .await?
                    .filter(|target| target.owner_id == caller.id)
                    .ok_or_else(|| {
                        HabitError::Validation(format!("linked habit {linked_id} does not exist"))
                    })?;
                Some(LinkedHabit {
                    id: target.id,
                    is_pleasant: target.is_pleasant,
                })
            }
            None => None,
        };

        let draft = HabitDraft {
            place: proposed.place.trim().to_string(),
            time: proposed.time,
            action: proposed.action.trim().to_string(),
            is_pleasant: proposed.is_pleasant,
            linked,
            period: proposed.period,
            reward: proposed.reward,
            length: proposed.length,
            is_public: proposed.is_public,
        };

        rules::validate(&draft)?;

        if let Some(this) = this
            && !draft.is_pleasant
            && self.store.count_habits_linking_to(this).await? > 0
        {
            return Err(HabitError::Validation(
                "a habit selected as a linked habit must stay pleasant".to_string(),
            ));
        }

        Ok(draft)
    }

    async fn store_update(&self, id: HabitId, draft: &HabitDraft) -> Result<Habit, HabitError> {
        let habit = self
            .store
            .update_habit(id, draft)
            .await?
            .ok_or(HabitError::NotFound(id))?;

        info!(habit_id = %id, "Updated habit");
        Ok(habit)
    }
}

#[async_trait]
impl HabitService for SeaOrmHabitService {
    async fn create(&self, caller: &User, payload: HabitPayload) -> Result<Habit, HabitError> {
        let draft = self.draft(caller, None, Proposed::from_payload(payload)).await?;
        let habit = self.store.add_habit(caller.id, &draft).await?;

        info!(habit_id = %habit.id, user_id = %caller.id, "Created habit");
        Ok(habit)
    }

    async fn list_own(
        &self,
        caller: &User,
        page: u64,
        page_size: u64,
    ) -> Result<HabitPage, HabitError> {
        Ok(self
            .store
            .list_habits_for_owner(caller.id, page.max(1), page_size.max(1))
            .await?)
    }

    async fn list_public(&self) -> Result<Vec<Habit>, HabitError> {
        Ok(self.store.list_public_habits().await?)
    }

    async fn get(&self, caller: &User, id: HabitId) -> Result<Habit, HabitError> {
        self.owned(caller, id).await
    }

    async fn replace(
        &self,
        caller: &User,
        id: HabitId,
        payload: HabitPayload,
    ) -> Result<Habit, HabitError> {
        self.owned(caller, id).await?;
        let draft = self.draft(caller, Some(id), Proposed::from_payload(payload)).await?;
        self.store_update(id, &draft).await
    }

    async fn update(
        &self,
        caller: &User,
        id: HabitId,
        patch: HabitPatch,
    ) -> Result<Habit, HabitError> {
        let existing = self.owned(caller, id).await?;
        let proposed = Proposed::from_habit(&existing).apply(patch);
        let draft = self.draft(caller, Some(id), proposed).await?;
        self.store_update(id, &draft).await
    }

    async fn delete(&self, caller: &User, id: HabitId) -> Result<(), HabitError> {
        self.owned(caller, id).await?;

        if !self.store.remove_habit(id).await? {
            return Err(HabitError::NotFound(id));
        }

        info!(habit_id = %id, "Deleted habit");
        Ok(())
    }
}
