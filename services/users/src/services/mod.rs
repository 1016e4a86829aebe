//! Domain services

pub mod auth;
pub mod generator;
pub mod import;

pub use auth::{AuthResponse, AuthService};
pub use import::{BatchImporter, BatchReport};
