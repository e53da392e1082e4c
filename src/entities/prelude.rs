pub use super::habits::Entity as Habits;
pub use super::users::Entity as Users;
