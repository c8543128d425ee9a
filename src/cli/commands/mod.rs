mod admin;
mod serve;
mod sessions;

pub use admin::cmd_admin_create;
pub use serve::cmd_serve;
pub use sessions::cmd_sessions_prune;
