pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, TokenGrant};
pub use auth_service_impl::SeaOrmAuthService;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{Registration, UserError, UserPatch, UserService};
pub use user_service_impl::SeaOrmUserService;

pub mod habit_service;
pub mod habit_service_impl;
pub use habit_service::{HabitError, HabitPatch, HabitPayload, HabitService};
pub use habit_service_impl::SeaOrmHabitService;

pub mod notifications;
pub use notifications::{NotificationService, SweepReport};

pub mod scheduler;
pub use scheduler::Scheduler;
