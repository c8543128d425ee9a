pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, IssuedSession};
pub use auth_service_impl::{Clock, SeaOrmAuthService, generate_session_token};

pub mod bootstrap;
pub use bootstrap::{BootstrapOutcome, ensure_bootstrap_admin};

pub mod password;
