mod notify;
mod staff;

pub use notify::cmd_notify;
pub use staff::cmd_create_staff;
