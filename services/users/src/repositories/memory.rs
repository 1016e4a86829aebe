//! In-memory store used by tests

use async_trait::async_trait;
use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{TokenRepository, UserRepository};
use crate::models::{NewToken, NewUser, Token, User};

/// Shared in-memory users and tokens, implementing both repository traits
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    users: Arc<RwLock<Vec<User>>>,
    tokens: Arc<RwLock<Vec<Token>>>,
    should_fail: Arc<RwLock<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with a query error
    pub async fn set_should_fail(&self, fail: bool) {
        *self.should_fail.write().await = fail;
    }

    async fn check_should_fail(&self) -> DatabaseResult<()> {
        if *self.should_fail.read().await {
            return Err(DatabaseError::Query(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    pub async fn users(&self) -> Vec<User> {
        self.users.read().await.clone()
    }

    pub async fn tokens(&self) -> Vec<Token> {
        self.tokens.read().await.clone()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        self.check_should_fail().await?;
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn exists_by_username(&self, username: &str) -> DatabaseResult<bool> {
        self.check_should_fail().await?;
        let users = self.users.read().await;
        Ok(users.iter().any(|u| u.username == username))
    }

    async fn save(&self, new_user: &NewUser) -> DatabaseResult<User> {
        self.check_should_fail().await?;
        let mut users = self.users.write().await;

        if users.iter().any(|u| u.username == new_user.username) {
            return Err(DatabaseError::Conflict(
                "users_username_key violated".to_string(),
            ));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            role: new_user.role,
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            birth_date: new_user.birth_date,
            city: new_user.city.clone(),
            country: new_user.country.clone(),
            avatar: new_user.avatar.clone(),
            company: new_user.company.clone(),
            job_position: new_user.job_position.clone(),
            mobile: new_user.mobile.clone(),
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_users_with_logged_out_tokens(&self) -> DatabaseResult<Vec<User>> {
        self.check_should_fail().await?;
        let users = self.users.read().await;
        let tokens = self.tokens.read().await;

        let mut found: Vec<User> = users
            .iter()
            .filter(|u| tokens.iter().any(|t| t.user_id == u.id && t.logged_out))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(found)
    }
}

#[async_trait]
impl TokenRepository for MemoryStore {
    async fn find_by_user(&self, user_id: Uuid) -> DatabaseResult<Vec<Token>> {
        self.check_should_fail().await?;
        let tokens = self.tokens.read().await;
        Ok(tokens.iter().filter(|t| t.user_id == user_id).cloned().collect())
    }

    async fn find_active_by_user(&self, user_id: Uuid) -> DatabaseResult<Vec<Token>> {
        self.check_should_fail().await?;
        let tokens = self.tokens.read().await;
        Ok(tokens
            .iter()
            .filter(|t| t.user_id == user_id && !t.logged_out)
            .cloned()
            .collect())
    }

    async fn find_by_token(&self, token: &str) -> DatabaseResult<Option<Token>> {
        self.check_should_fail().await?;
        let tokens = self.tokens.read().await;
        Ok(tokens.iter().find(|t| t.token == token).cloned())
    }

    async fn save(&self, new_token: &NewToken) -> DatabaseResult<Token> {
        self.check_should_fail().await?;
        let mut tokens = self.tokens.write().await;

        if tokens.iter().any(|t| t.token == new_token.token) {
            return Err(DatabaseError::Conflict("tokens_token_key violated".to_string()));
        }

        let token = Token {
            id: Uuid::new_v4(),
            token: new_token.token.clone(),
            user_id: new_token.user_id,
            logged_out: new_token.logged_out,
            created_at: Utc::now(),
        };
        tokens.push(token.clone());
        Ok(token)
    }

    async fn save_all(&self, updated: &[Token]) -> DatabaseResult<()> {
        self.check_should_fail().await?;
        let mut tokens = self.tokens.write().await;
        for token in updated {
            if let Some(stored) = tokens.iter_mut().find(|t| t.id == token.id) {
                stored.logged_out = token.logged_out;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: Some(format!("{}@example.com", username)),
            password_hash: "hash".to_string(),
            role: Role::User,
            first_name: Some("John".to_string()),
            last_name: Some("Doe".to_string()),
            birth_date: chrono::NaiveDate::from_ymd_opt(1990, 1, 1),
            city: Some("New York".to_string()),
            country: Some("US".to_string()),
            avatar: None,
            company: None,
            job_position: None,
            mobile: None,
        }
    }

    #[tokio::test]
    async fn test_save_then_find_round_trips() {
        let store = MemoryStore::new();
        let saved = UserRepository::save(&store, &new_user("john_doe")).await.unwrap();

        let found = store.find_by_username("john_doe").await.unwrap().unwrap();
        assert_eq!(found, saved);
        assert!(store.exists_by_username("john_doe").await.unwrap());
        assert!(!store.exists_by_username("jane").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = MemoryStore::new();
        UserRepository::save(&store, &new_user("john_doe")).await.unwrap();

        let err = UserRepository::save(&store, &new_user("john_doe"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.users().await.len(), 1);
    }

    #[tokio::test]
    async fn test_logged_out_users_are_distinct() {
        let store = MemoryStore::new();
        let john = UserRepository::save(&store, &new_user("john_doe")).await.unwrap();
        UserRepository::save(&store, &new_user("jane_smith")).await.unwrap();

        for value in ["a", "b"] {
            let mut token = NewToken::active(value.to_string(), john.id);
            token.logged_out = true;
            TokenRepository::save(&store, &token).await.unwrap();
        }

        let users = store.find_users_with_logged_out_tokens().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "john_doe");
    }

    #[tokio::test]
    async fn test_find_by_user_ignores_flag_but_active_filters() {
        let store = MemoryStore::new();
        let john = UserRepository::save(&store, &new_user("john_doe")).await.unwrap();

        let old = TokenRepository::save(&store, &NewToken::active("old".to_string(), john.id))
            .await
            .unwrap();
        TokenRepository::save(&store, &NewToken::active("new".to_string(), john.id))
            .await
            .unwrap();
        store
            .save_all(&[Token {
                logged_out: true,
                ..old
            }])
            .await
            .unwrap();

        assert_eq!(store.find_by_user(john.id).await.unwrap().len(), 2);
        let active = store.find_active_by_user(john.id).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].token, "new");
        assert!(store.find_by_token("old").await.unwrap().unwrap().logged_out);
    }
}
