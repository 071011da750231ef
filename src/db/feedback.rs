use sqlx::{Row, SqlitePool};

use crate::error::AppError;
use crate::models::feedback::Feedback;

fn row_to_feedback(row: sqlx::sqlite::SqliteRow) -> Feedback {
    Feedback {
        id: row.get("id"),
        membership_id: row.get("membership_id"),
        message: row.get("message"),
        created_at: row.get("created_at"),
    }
}

pub async fn create_feedback(
    pool: &SqlitePool,
    membership_id: i64,
    message: &str,
) -> Result<Feedback, AppError> {
    let row = sqlx::query(
        "INSERT INTO feedback (membership_id, message) VALUES (?, ?) \
         RETURNING id, membership_id, message, created_at",
    )
    .bind(membership_id)
    .bind(message)
    .fetch_one(pool)
    .await?;

    Ok(row_to_feedback(row))
}

pub async fn list_for_membership(
    pool: &SqlitePool,
    membership_id: i64,
) -> Result<Vec<Feedback>, AppError> {
    let rows = sqlx::query(
        "SELECT id, membership_id, message, created_at FROM feedback WHERE membership_id = ? ORDER BY id ASC",
    )
    .bind(membership_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(row_to_feedback).collect())
}
