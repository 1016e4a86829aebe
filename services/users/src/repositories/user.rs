//! PostgreSQL credential store

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;

use super::UserRepository;
use crate::models::{NewUser, Role, User};

const USER_COLUMNS: &str = "id, username, email, password_hash, role, first_name, last_name, \
     birth_date, city, country, avatar, company, job_position, mobile, created_at";

/// User repository backed by PostgreSQL
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    let role: String = row.try_get("role")?;
    let role = role
        .parse::<Role>()
        .map_err(|e| sqlx::Error::Decode(e.into()))?;

    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        birth_date: row.try_get("birth_date")?,
        city: row.try_get("city")?,
        country: row.try_get("country")?,
        avatar: row.try_get("avatar")?,
        company: row.try_get("company")?,
        job_position: row.try_get("job_position")?,
        mobile: row.try_get("mobile")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        info!("Finding user by username: {}", username);

        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(DatabaseError::Query)
    }

    async fn exists_by_username(&self, username: &str) -> DatabaseResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await
                .map_err(DatabaseError::Query)?;

        Ok(exists)
    }

    async fn save(&self, new_user: &NewUser) -> DatabaseResult<User> {
        info!("Creating new user: {}", new_user.username);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, role, first_name, last_name,
                               birth_date, city, country, avatar, company, job_position, mobile)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.role.as_str())
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(new_user.birth_date)
        .bind(&new_user.city)
        .bind(&new_user.country)
        .bind(&new_user.avatar)
        .bind(&new_user.company)
        .bind(&new_user.job_position)
        .bind(&new_user.mobile)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        user_from_row(&row).map_err(DatabaseError::Query)
    }

    async fn find_users_with_logged_out_tokens(&self) -> DatabaseResult<Vec<User>> {
        info!("Finding users with logged-out tokens");

        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM users u
            WHERE EXISTS (
                SELECT 1 FROM tokens t WHERE t.user_id = u.id AND t.logged_out = TRUE
            )
            ORDER BY u.username
            "#,
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        rows.iter()
            .map(user_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(DatabaseError::Query)
    }
}
