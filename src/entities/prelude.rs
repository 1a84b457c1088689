pub use super::articles::Entity as Articles;
pub use super::permissions::Entity as Permissions;
pub use super::user_permissions::Entity as UserPermissions;
pub use super::users::Entity as Users;
