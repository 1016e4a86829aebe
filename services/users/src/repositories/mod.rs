//! Repositories for database operations

use async_trait::async_trait;
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::models::{NewToken, NewUser, Token, User};

#[cfg(test)]
pub mod memory;
pub mod token;
pub mod user;

pub use token::PgTokenRepository;
pub use user::PgUserRepository;

/// Credential store: owns user records
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by username
    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>>;

    /// Check whether a username is taken
    async fn exists_by_username(&self, username: &str) -> DatabaseResult<bool>;

    /// Insert a user, assigning its id.
    ///
    /// A taken username yields [`common::error::DatabaseError::Conflict`].
    async fn save(&self, new_user: &NewUser) -> DatabaseResult<User>;

    /// Users having at least one logged-out token, without duplicates
    async fn find_users_with_logged_out_tokens(&self) -> DatabaseResult<Vec<User>>;
}

/// Token ledger: owns issued token records
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Every token ever issued to the user, whatever its flag
    async fn find_by_user(&self, user_id: Uuid) -> DatabaseResult<Vec<Token>>;

    /// Tokens of the user that are not logged out
    async fn find_active_by_user(&self, user_id: Uuid) -> DatabaseResult<Vec<Token>>;

    /// Look a token record up by its token string
    async fn find_by_token(&self, token: &str) -> DatabaseResult<Option<Token>>;

    /// Record a newly issued token
    async fn save(&self, new_token: &NewToken) -> DatabaseResult<Token>;

    /// Persist the logged-out flag of every given token
    async fn save_all(&self, tokens: &[Token]) -> DatabaseResult<()>;
}
