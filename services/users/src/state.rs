//! Application state shared across handlers

use std::sync::Arc;

use crate::{
    config::ServerConfig,
    jwt::JwtService,
    password::PasswordHasher,
    repositories::{TokenRepository, UserRepository},
    services::{AuthService, BatchImporter},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository>,
    pub token_repository: Arc<dyn TokenRepository>,
    pub jwt_service: JwtService,
    pub auth_service: AuthService,
    pub batch_importer: BatchImporter,
    pub server_config: ServerConfig,
}

impl AppState {
    /// Wire services on top of the given stores
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        token_repository: Arc<dyn TokenRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
        jwt_service: JwtService,
        server_config: ServerConfig,
    ) -> Self {
        let auth_service = AuthService::new(
            user_repository.clone(),
            token_repository.clone(),
            password_hasher.clone(),
            jwt_service.clone(),
        );
        let batch_importer = BatchImporter::new(user_repository.clone(), password_hasher);

        Self {
            user_repository,
            token_repository,
            jwt_service,
            auth_service,
            batch_importer,
            server_config,
        }
    }
}
