//! Authentication and registration

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    error::{ApiError, ApiResult},
    jwt::JwtService,
    models::{NewToken, NewUser, Role, User, UserProfile, UserRecord},
    password::{PasswordHasher, hash_blocking, verify_blocking},
    repositories::{TokenRepository, UserRepository},
    validation::{validate_email, validate_password, validate_username},
};

/// Response for a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

/// Verifies credentials and manages the token ledger on login
#[derive(Clone)]
pub struct AuthService {
    user_repository: Arc<dyn UserRepository>,
    token_repository: Arc<dyn TokenRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
    jwt_service: JwtService,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        token_repository: Arc<dyn TokenRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
        jwt_service: JwtService,
    ) -> Self {
        Self {
            user_repository,
            token_repository,
            password_hasher,
            jwt_service,
        }
    }

    /// Authenticate a user and issue a fresh token.
    ///
    /// Every previously active token of the user is revoked before the new
    /// one is recorded, so at most one token stays active after a login.
    /// Failed verification leaves the ledger untouched.
    pub async fn authenticate(&self, username: &str, password: &str) -> ApiResult<AuthResponse> {
        info!("Login attempt for user: {}", username);

        self.verify_credentials(username, password).await?;

        let user = self
            .user_repository
            .find_by_username(username)
            .await?
            .ok_or_else(|| {
                ApiError::Unexpected(format!("User {} vanished after verification", username))
            })?;

        let token = self.jwt_service.generate_token(&user)?;

        self.revoke_all_tokens(&user).await?;
        self.token_repository
            .save(&NewToken::active(token.clone(), user.id))
            .await?;

        info!("Issued token for user: {}", username);
        Ok(AuthResponse { token })
    }

    /// Register a single user; a taken username is a hard conflict.
    ///
    /// Self-registered accounts always get the USER role.
    pub async fn register(&self, mut record: UserRecord) -> ApiResult<UserProfile> {
        info!("Registration attempt for user: {}", record.username);

        if record.role != Role::User {
            warn!(
                "Ignoring requested role {} for self-registration of {}",
                record.role, record.username
            );
            record.role = Role::User;
        }

        validate_username(&record.username).map_err(ApiError::BadRequest)?;
        validate_email(record.email.as_deref().unwrap_or_default())
            .map_err(ApiError::BadRequest)?;
        validate_password(&record.password).map_err(ApiError::BadRequest)?;

        if self
            .user_repository
            .exists_by_username(&record.username)
            .await?
        {
            return Err(ApiError::Conflict(format!(
                "Username {} is already taken",
                record.username
            )));
        }

        let password_hash =
            hash_blocking(self.password_hasher.clone(), record.password.clone()).await?;
        let user = self
            .user_repository
            .save(&NewUser::from_record(record, password_hash))
            .await?;

        Ok(UserProfile::from(&user))
    }

    async fn verify_credentials(&self, username: &str, password: &str) -> ApiResult<()> {
        let Some(user) = self.user_repository.find_by_username(username).await? else {
            warn!("Login attempt for unknown user: {}", username);
            return Err(ApiError::InvalidCredentials);
        };

        let matches = verify_blocking(
            self.password_hasher.clone(),
            password.to_string(),
            user.password_hash,
        )
        .await?;

        if matches {
            Ok(())
        } else {
            warn!("Wrong password for user: {}", username);
            Err(ApiError::InvalidCredentials)
        }
    }

    async fn revoke_all_tokens(&self, user: &User) -> ApiResult<()> {
        let mut tokens = self.token_repository.find_active_by_user(user.id).await?;
        if tokens.is_empty() {
            return Ok(());
        }

        for token in &mut tokens {
            token.logged_out = true;
        }

        info!("Revoking {} token(s) for user: {}", tokens.len(), user.username);
        self.token_repository.save_all(&tokens).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        jwt::JwtConfig,
        password::{Argon2Hasher, test_hasher},
        repositories::memory::MemoryStore,
    };
    use async_trait::async_trait;
    use common::error::DatabaseResult;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Finds the user once, then behaves as if it had been deleted
    struct VanishingUsers {
        store: MemoryStore,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl UserRepository for VanishingUsers {
        async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
            if self.lookups.fetch_add(1, Ordering::SeqCst) == 0 {
                self.store.find_by_username(username).await
            } else {
                Ok(None)
            }
        }

        async fn exists_by_username(&self, username: &str) -> DatabaseResult<bool> {
            self.store.exists_by_username(username).await
        }

        async fn save(&self, new_user: &NewUser) -> DatabaseResult<User> {
            UserRepository::save(&self.store, new_user).await
        }

        async fn find_users_with_logged_out_tokens(&self) -> DatabaseResult<Vec<User>> {
            self.store.find_users_with_logged_out_tokens().await
        }
    }

    async fn setup() -> (AuthService, MemoryStore) {
        let store = MemoryStore::new();
        let hasher = test_hasher();
        let jwt_service = JwtService::new(JwtConfig::with_secret("test-secret", 3600)).unwrap();

        let new_user = NewUser::from_record(
            UserRecord {
                username: "john_doe".to_string(),
                email: Some("john.doe@example.com".to_string()),
                role: Role::User,
                ..Default::default()
            },
            hasher.hash("password123").unwrap(),
        );
        UserRepository::save(&store, &new_user).await.unwrap();

        let service = AuthService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(hasher),
            jwt_service,
        );
        (service, store)
    }

    #[tokio::test]
    async fn test_authenticate_issues_single_active_token() {
        let (service, store) = setup().await;

        let response = service.authenticate("john_doe", "password123").await.unwrap();
        assert!(!response.token.is_empty());

        let tokens = store.tokens().await;
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token, response.token);
        assert!(!tokens[0].logged_out);
    }

    #[tokio::test]
    async fn test_reauthentication_revokes_prior_tokens() {
        let (service, store) = setup().await;

        let first = service.authenticate("john_doe", "password123").await.unwrap();
        let second = service.authenticate("john_doe", "password123").await.unwrap();
        let third = service.authenticate("john_doe", "password123").await.unwrap();

        let tokens = store.tokens().await;
        assert_eq!(tokens.len(), 3);

        let active: Vec<_> = tokens.iter().filter(|t| !t.logged_out).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].token, third.token);

        for revoked in [&first.token, &second.token] {
            let token = tokens.iter().find(|t| &t.token == revoked).unwrap();
            assert!(token.logged_out);
        }
    }

    #[tokio::test]
    async fn test_wrong_password_leaves_ledger_unchanged() {
        let (service, store) = setup().await;
        service.authenticate("john_doe", "password123").await.unwrap();
        let before = store.tokens().await;

        let err = service.authenticate("john_doe", "wrong").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials));
        assert_eq!(store.tokens().await, before);
    }

    #[tokio::test]
    async fn test_unknown_user_is_invalid_credentials() {
        let (service, store) = setup().await;

        let err = service.authenticate("nobody", "password123").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials));
        assert!(store.tokens().await.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_not_reported_as_bad_credentials() {
        let (service, store) = setup().await;
        store.set_should_fail(true).await;

        let err = service.authenticate("john_doe", "password123").await.unwrap_err();
        assert!(matches!(err, ApiError::Database(_)));
    }

    #[tokio::test]
    async fn test_user_vanishing_after_verification_is_unexpected() {
        let (service, store) = setup().await;
        service.authenticate("john_doe", "password123").await.unwrap();
        let before = store.tokens().await;

        let vanishing = AuthService::new(
            Arc::new(VanishingUsers {
                store: store.clone(),
                lookups: AtomicUsize::new(0),
            }),
            Arc::new(store.clone()),
            Arc::new(test_hasher()),
            JwtService::new(JwtConfig::with_secret("test-secret", 3600)).unwrap(),
        );

        let err = vanishing
            .authenticate("john_doe", "password123")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unexpected(_)));
        assert_eq!(store.tokens().await, before);
    }

    #[tokio::test]
    async fn test_register_hashes_password_and_rejects_duplicates() {
        let (service, store) = setup().await;
        let record = UserRecord {
            username: "jane_smith".to_string(),
            email: Some("jane.smith@example.com".to_string()),
            password: "password456".to_string(),
            role: Role::Admin,
            ..Default::default()
        };

        let profile = service.register(record.clone()).await.unwrap();
        assert_eq!(profile.username, "jane_smith");
        assert_eq!(profile.role, Role::User);

        let stored = store.find_by_username("jane_smith").await.unwrap().unwrap();
        assert_eq!(stored.role, Role::User);
        assert_ne!(stored.password_hash, "password456");
        assert!(Argon2Hasher::new().verify("password456", &stored.password_hash));

        let err = service.register(record).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let (service, _store) = setup().await;
        let record = UserRecord {
            username: "jane_smith".to_string(),
            email: Some("not-an-email".to_string()),
            password: "password456".to_string(),
            ..Default::default()
        };

        let err = service.register(record).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
