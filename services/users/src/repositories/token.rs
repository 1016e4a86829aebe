//! PostgreSQL token ledger

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::TokenRepository;
use crate::models::{NewToken, Token};

/// Token repository backed by PostgreSQL
#[derive(Clone)]
pub struct PgTokenRepository {
    pool: PgPool,
}

impl PgTokenRepository {
    /// Create a new token repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn token_from_row(row: &PgRow) -> Result<Token, sqlx::Error> {
    Ok(Token {
        id: row.try_get("id")?,
        token: row.try_get("token")?,
        user_id: row.try_get("user_id")?,
        logged_out: row.try_get("logged_out")?,
        created_at: row.try_get("created_at")?,
    })
}

fn tokens_from_rows(rows: &[PgRow]) -> DatabaseResult<Vec<Token>> {
    rows.iter()
        .map(token_from_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::Query)
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    async fn find_by_user(&self, user_id: Uuid) -> DatabaseResult<Vec<Token>> {
        let rows = sqlx::query(
            r#"
            SELECT id, token, user_id, logged_out, created_at
            FROM tokens
            WHERE user_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        tokens_from_rows(&rows)
    }

    async fn find_active_by_user(&self, user_id: Uuid) -> DatabaseResult<Vec<Token>> {
        let rows = sqlx::query(
            r#"
            SELECT id, token, user_id, logged_out, created_at
            FROM tokens
            WHERE user_id = $1 AND logged_out = FALSE
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        tokens_from_rows(&rows)
    }

    async fn find_by_token(&self, token: &str) -> DatabaseResult<Option<Token>> {
        let row = sqlx::query(
            r#"
            SELECT id, token, user_id, logged_out, created_at
            FROM tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        row.as_ref()
            .map(token_from_row)
            .transpose()
            .map_err(DatabaseError::Query)
    }

    async fn save(&self, new_token: &NewToken) -> DatabaseResult<Token> {
        info!("Recording token for user: {}", new_token.user_id);

        let row = sqlx::query(
            r#"
            INSERT INTO tokens (token, user_id, logged_out)
            VALUES ($1, $2, $3)
            RETURNING id, token, user_id, logged_out, created_at
            "#,
        )
        .bind(&new_token.token)
        .bind(new_token.user_id)
        .bind(new_token.logged_out)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        token_from_row(&row).map_err(DatabaseError::Query)
    }

    async fn save_all(&self, tokens: &[Token]) -> DatabaseResult<()> {
        if tokens.is_empty() {
            return Ok(());
        }

        info!("Updating {} token(s)", tokens.len());

        let mut tx = self.pool.begin().await.map_err(DatabaseError::Query)?;
        for token in tokens {
            sqlx::query("UPDATE tokens SET logged_out = $1 WHERE id = $2")
                .bind(token.logged_out)
                .bind(token.id)
                .execute(&mut *tx)
                .await
                .map_err(DatabaseError::Query)?;
        }
        tx.commit().await.map_err(DatabaseError::Query)?;

        Ok(())
    }
}
