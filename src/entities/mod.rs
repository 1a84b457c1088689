pub mod prelude;

pub mod articles;
pub mod permissions;
pub mod user_permissions;
pub mod users;
