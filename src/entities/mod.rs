pub mod prelude;

pub mod habits;
pub mod users;
