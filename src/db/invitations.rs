use chrono::NaiveDate;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::error::AppError;
use crate::models::invitation::Invitation;

fn row_to_invitation(row: sqlx::sqlite::SqliteRow) -> Invitation {
    Invitation {
        id: row.get("id"),
        code: row.get("code"),
        membership_id: row.get("membership_id"),
        expires: row.get("expires"),
        invited_by: row.get("invited_by"),
        created_at: row.get("created_at"),
    }
}

const SELECT_INVITATIONS: &str =
    "SELECT id, code, membership_id, expires, invited_by, created_at FROM invitations";

pub async fn find_by_code(pool: &SqlitePool, code: &str) -> Result<Option<Invitation>, AppError> {
    let row = sqlx::query(&format!("{SELECT_INVITATIONS} WHERE code = ?"))
        .bind(code)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(row_to_invitation))
}

pub async fn list_for_membership(
    pool: &SqlitePool,
    membership_id: i64,
) -> Result<Vec<Invitation>, AppError> {
    let rows = sqlx::query(&format!(
        "{SELECT_INVITATIONS} WHERE membership_id = ? ORDER BY id ASC"
    ))
    .bind(membership_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(row_to_invitation).collect())
}

pub async fn create_invitation(
    conn: &mut SqliteConnection,
    code: &str,
    membership_id: i64,
    expires: NaiveDate,
    invited_by: Option<&str>,
) -> Result<Invitation, AppError> {
    let row = sqlx::query(
        "INSERT INTO invitations (code, membership_id, expires, invited_by) VALUES (?, ?, ?, ?) \
         RETURNING id, code, membership_id, expires, invited_by, created_at",
    )
    .bind(code)
    .bind(membership_id)
    .bind(expires)
    .bind(invited_by)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row_to_invitation(row))
}

/// Delete an invitation by code. Returns `false` when the code was already
/// gone, which callers treat as "already processed".
pub async fn delete_by_code(conn: &mut SqliteConnection, code: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM invitations WHERE code = ?")
        .bind(code)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete every invitation of a membership except `keep_id`.
pub async fn delete_others_for_membership(
    conn: &mut SqliteConnection,
    membership_id: i64,
    keep_id: i64,
) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM invitations WHERE membership_id = ? AND id <> ?")
        .bind(membership_id)
        .bind(keep_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}
