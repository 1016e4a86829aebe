//! User management models

pub mod role;
pub mod token;
pub mod user;

// Re-export for convenience
pub use role::Role;
pub use token::{NewToken, Token};
pub use user::{LoginCredentials, NewUser, User, UserProfile, UserRecord};
