pub mod prelude;

pub mod admin_users;
pub mod documents;
pub mod sessions;
