pub use super::admin_users::Entity as AdminUsers;
pub use super::documents::Entity as Documents;
pub use super::sessions::Entity as Sessions;
