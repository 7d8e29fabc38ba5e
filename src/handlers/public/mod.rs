// handlers/public - endpoints that do not require a bearer token

pub mod auth;
pub mod health;

pub use auth::login;
pub use health::{health, not_found, root};
