//! Domain types for habit tracking.
//!
//! Identifiers are newtypes so a habit id cannot be passed where a user id is
//! expected. [`HabitDraft`] is the fully-resolved record the write-time rules
//! in [`rules`] run against.

pub mod rules;
pub mod schedule;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn value(&self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self::new(id)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_i32(self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                i32::deserialize(deserializer).map(Self::new)
            }
        }
    };
}

entity_id!(
    /// Primary key of a row in `users`.
    UserId
);

entity_id!(
    /// Primary key of a row in `habits`.
    HabitId
);

/// The habit referenced through `linked`, reduced to what the rules need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkedHabit {
    pub id: HabitId,
    pub is_pleasant: bool,
}

/// A candidate habit: stored values merged with the proposed changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitDraft {
    pub place: String,
    pub time: NaiveTime,
    pub action: String,
    pub is_pleasant: bool,
    pub linked: Option<LinkedHabit>,
    pub period: i32,
    pub reward: Option<String>,
    pub length: i32,
    pub is_public: bool,
}

impl HabitDraft {
    /// The reward text if one is set and not blank.
    #[must_use]
    pub fn reward(&self) -> Option<&str> {
        self.reward.as_deref().filter(|r| !r.trim().is_empty())
    }

    #[must_use]
    pub fn has_reward(&self) -> bool {
        self.reward().is_some()
    }

    #[must_use]
    pub const fn has_linked(&self) -> bool {
        self.linked.is_some()
    }
}

/// Trims an email address and lowercases its domain part.
#[must_use]
pub fn canonical_email(raw: &str) -> String {
    let email = raw.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}
