//! Domain service for habits.
//!
//! Every write resolves the linked habit, merges the request with the stored
//! row into a [`HabitDraft`], runs the field checks and then the rule set.
//! Nothing is written unless all of them pass.

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::db::{Habit, HabitPage, User};
use crate::domain::rules::RuleViolation;
use crate::domain::HabitId;

#[derive(Debug, Error)]
pub enum HabitError {
    #[error("Habit {0} not found")]
    NotFound(HabitId),

    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error(transparent)]
    Rule(#[from] RuleViolation),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for HabitError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for HabitError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Full habit body for create and replace.
#[derive(Debug, Clone, Deserialize)]
pub struct HabitPayload {
    pub place: String,
    #[serde(deserialize_with = "time_of_day")]
    pub time: NaiveTime,
    pub action: String,
    pub is_pleasant: bool,
    #[serde(default)]
    pub linked: Option<HabitId>,
    pub period: i32,
    #[serde(default)]
    pub reward: Option<String>,
    pub length: i32,
    pub is_public: bool,
}

/// Partial habit body. For `linked` and `reward` an explicit `null` clears
/// the value while an absent key keeps it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HabitPatch {
    #[serde(default)]
    pub place: Option<String>,
    #[serde(default, deserialize_with = "optional_time_of_day")]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub is_pleasant: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub linked: Option<Option<HabitId>>,
    #[serde(default)]
    pub period: Option<i32>,
    #[serde(default, deserialize_with = "present")]
    pub reward: Option<Option<String>>,
    #[serde(default)]
    pub length: Option<i32>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

fn time_of_day<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_time_of_day(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid time of day: {raw}")))
}

fn optional_time_of_day<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
where
    D: Deserializer<'de>,
{
    time_of_day(deserializer).map(Some)
}

pub(crate) fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[async_trait::async_trait]
pub trait HabitService: Send + Sync {
    /// Creates a habit owned by `caller`.
    async fn create(&self, caller: &User, payload: HabitPayload) -> Result<Habit, HabitError>;

    /// The caller's habits, one page at a time. `page` starts at 1.
    async fn list_own(
        &self,
        caller: &User,
        page: u64,
        page_size: u64,
    ) -> Result<HabitPage, HabitError>;

    async fn list_public(&self) -> Result<Vec<Habit>, HabitError>;

    async fn get(&self, caller: &User, id: HabitId) -> Result<Habit, HabitError>;

    async fn replace(
        &self,
        caller: &User,
        id: HabitId,
        payload: HabitPayload,
    ) -> Result<Habit, HabitError>;

    async fn update(&self, caller: &User, id: HabitId, patch: HabitPatch)
    -> Result<Habit, HabitError>;

    async fn delete(&self, caller: &User, id: HabitId) -> Result<(), HabitError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_of_day() {
        let t = NaiveTime::from_hms_opt(7, 30, 0).unwrap();
        assert_eq!(parse_time_of_day("07:30"), Some(t));
        assert_eq!(parse_time_of_day("07:30:00"), Some(t));
        assert_eq!(parse_time_of_day("25:00"), None);
        assert_eq!(parse_time_of_day("morning"), None);
    }

    #[test]
    fn test_patch_distinguishes_null_from_absent() {
        let absent: HabitPatch = serde_json::from_str(r#"{"place": "Gym"}"#).unwrap();
        assert_eq!(absent.linked, None);
        assert_eq!(absent.reward, None);

        let cleared: HabitPatch =
            serde_json::from_str(r#"{"linked": null, "reward": null}"#).unwrap();
        assert_eq!(cleared.linked, Some(None));
        assert_eq!(cleared.reward, Some(None));

        let set: HabitPatch = serde_json::from_str(r#"{"linked": 4, "time": "18:15"}"#).unwrap();
        assert_eq!(set.linked, Some(Some(HabitId::new(4))));
        assert_eq!(set.time, NaiveTime::from_hms_opt(18, 15, 0));
    }

    #[test]
    fn test_payload_requires_flags() {
        let missing = serde_json::from_str::<HabitPayload>(
            r#"{"place": "Home", "time": "08:00", "action": "Read", "period": 1, "length": 60}"#,
        );
        assert!(missing.is_err());

        let full: HabitPayload = serde_json::from_str(
            r#"{"place": "Home", "time": "08:00", "action": "Read", "is_pleasant": false,
                "period": 1, "length": 60, "is_public": true, "reward": "Tea"}"#,
        )
        .unwrap();
        assert_eq!(full.linked, None);
        assert_eq!(full.reward.as_deref(), Some("Tea"));
    }
}
