//! User management service
//!
//! Credential-based login issuing JSON Web Tokens, synthetic user
//! generation, batch import of user records and lookup of users whose
//! tokens were logged out.

pub mod config;
pub mod database;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;

pub use state::AppState;
