use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use common::database::{DatabaseConfig, health_check, init_pool};
use users::{
    AppState,
    config::ServerConfig,
    database::run_migrations,
    jwt::{JwtConfig, JwtService},
    password::Argon2Hasher,
    repositories::{PgTokenRepository, PgUserRepository},
    routes,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting user management service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;

    // Signing keys are loaded once and never change for the process lifetime
    let jwt_service = JwtService::new(JwtConfig::from_env()?)?;
    let server_config = ServerConfig::load()?;

    let app_state = AppState::new(
        Arc::new(PgUserRepository::new(pool.clone())),
        Arc::new(PgTokenRepository::new(pool)),
        Arc::new(Argon2Hasher::new()),
        jwt_service,
        server_config.clone(),
    );

    // Start the web server
    let app = routes::create_router(app_state);

    let address = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("User management service listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
