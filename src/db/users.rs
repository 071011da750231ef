use sqlx::{Row, SqlitePool};

use crate::error::AppError;
use crate::models::user::User;

fn row_to_user(row: sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        is_admin: row.get("is_admin"),
        created_at: row.get("created_at"),
    }
}

pub async fn get_user(pool: &SqlitePool, user_id: i64) -> Result<User, AppError> {
    let row = sqlx::query("SELECT id, username, is_admin, created_at FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("unknown_user".to_string()))?;

    Ok(row_to_user(row))
}

pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    is_admin: bool,
) -> Result<User, AppError> {
    let username = username.trim();
    if username.is_empty() || username.len() > 32 {
        return Err(AppError::BadRequest(
            "username must be between 1 and 32 characters".to_string(),
        ));
    }

    let id = sqlx::query("INSERT INTO users (username, is_admin) VALUES (?, ?)")
        .bind(username)
        .bind(is_admin)
        .execute(pool)
        .await?
        .last_insert_rowid();

    get_user(pool, id).await
}

/// Store a bearer token by its hash. The raw token is never persisted.
pub async fn insert_token(
    pool: &SqlitePool,
    user_id: i64,
    token_hash: &str,
    expires_at: &str,
) -> Result<(), AppError> {
    sqlx::query("INSERT INTO user_tokens (token_hash, user_id, expires_at) VALUES (?, ?, ?)")
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .execute(pool)
        .await?;
    Ok(())
}
