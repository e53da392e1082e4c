use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{Habit, HabitPage, User};
use crate::domain::{HabitId, UserId};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Public view of an account. Never carries the password hash or token.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: UserId,
    pub email: String,
    pub tg_username: String,
    pub tg_chat_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_staff: bool,
    pub is_active: bool,
    pub created_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            tg_username: user.tg_username,
            tg_chat_id: user.tg_chat_id,
            first_name: user.first_name,
            last_name: user.last_name,
            is_staff: user.is_staff,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HabitDto {
    pub id: HabitId,
    pub owner: UserId,
    pub place: String,
    /// `HH:MM:SS`
    pub time: String,
    pub action: String,
    pub is_pleasant: bool,
    pub linked: Option<HabitId>,
    pub period: i32,
    pub reward: Option<String>,
    pub length: i32,
    pub is_public: bool,
    pub last_dispatch_time: Option<DateTime<Utc>>,
}

impl From<Habit> for HabitDto {
    fn from(habit: Habit) -> Self {
        Self {
            id: habit.id,
            owner: habit.owner_id,
            place: habit.place,
            time: habit.time.format("%H:%M:%S").to_string(),
            action: habit.action,
            is_pleasant: habit.is_pleasant,
            linked: habit.linked_id,
            period: habit.period,
            reward: habit.reward,
            length: habit.length,
            is_public: habit.is_public,
            last_dispatch_time: habit.last_dispatch_time,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HabitPageDto {
    pub count: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub results: Vec<HabitDto>,
}

impl HabitPageDto {
    #[must_use]
    pub fn new(page: HabitPage, number: u64, page_size: u64) -> Self {
        Self {
            count: page.total,
            page: number,
            page_size,
            total_pages: page.total_pages,
            results: page.items.into_iter().map(HabitDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenDto {
    pub user_id: UserId,
    pub token: String,
}
