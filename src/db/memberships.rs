use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::error::AppError;
use crate::models::membership::{Attendance, CreateMembership, Membership, RsvpDetails};

fn row_to_membership(row: sqlx::sqlite::SqliteRow) -> Result<Membership, AppError> {
    let attendance: String = row.get("attendance");
    let attendance = attendance.parse::<Attendance>().map_err(AppError::Internal)?;

    Ok(Membership {
        id: row.get("id"),
        event_id: row.get("event_id"),
        person_id: row.get("person_id"),
        role: row.get("role"),
        attendance,
        arrival_date: row.get("arrival_date"),
        departure_date: row.get("departure_date"),
        has_guest: row.get("has_guest"),
        guest_disclaimer: row.get("guest_disclaimer"),
        special_info: row.get("special_info"),
        replied_at: row.get("replied_at"),
        updated_by: row.get("updated_by"),
    })
}

const MEMBERSHIP_COLUMNS: &str = "id, event_id, person_id, role, attendance, arrival_date, departure_date, has_guest, guest_disclaimer, special_info, replied_at, updated_by";
const SELECT_MEMBERSHIPS: &str = "SELECT id, event_id, person_id, role, attendance, arrival_date, departure_date, has_guest, guest_disclaimer, special_info, replied_at, updated_by FROM memberships";

pub async fn get_membership(pool: &SqlitePool, membership_id: i64) -> Result<Membership, AppError> {
    let row = sqlx::query(&format!("{SELECT_MEMBERSHIPS} WHERE id = ?"))
        .bind(membership_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("unknown_membership".to_string()))?;

    row_to_membership(row)
}

pub async fn find_for(
    pool: &SqlitePool,
    event_id: i64,
    person_id: i64,
) -> Result<Option<Membership>, AppError> {
    let row = sqlx::query(&format!(
        "{SELECT_MEMBERSHIPS} WHERE event_id = ? AND person_id = ?"
    ))
    .bind(event_id)
    .bind(person_id)
    .fetch_optional(pool)
    .await?;

    row.map(row_to_membership).transpose()
}

pub async fn list_for_event(pool: &SqlitePool, event_id: i64) -> Result<Vec<Membership>, AppError> {
    let rows = sqlx::query(&format!(
        "{SELECT_MEMBERSHIPS} WHERE event_id = ? ORDER BY id ASC"
    ))
    .bind(event_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_to_membership).collect()
}

pub async fn create_membership(
    pool: &SqlitePool,
    input: &CreateMembership,
) -> Result<Membership, AppError> {
    let id = sqlx::query(
        "INSERT INTO memberships (event_id, person_id, role, attendance) VALUES (?, ?, ?, ?)",
    )
    .bind(input.event_id)
    .bind(input.person_id)
    .bind(&input.role)
    .bind(input.attendance.as_str())
    .execute(pool)
    .await?
    .last_insert_rowid();

    get_membership(pool, id).await
}

/// Organizer-side attendance change (no reply timestamp).
pub async fn update_attendance(
    pool: &SqlitePool,
    membership_id: i64,
    attendance: Attendance,
    updated_by: &str,
) -> Result<Membership, AppError> {
    sqlx::query("UPDATE memberships SET attendance = ?, updated_by = ? WHERE id = ?")
        .bind(attendance.as_str())
        .bind(updated_by)
        .bind(membership_id)
        .execute(pool)
        .await?;

    get_membership(pool, membership_id).await
}

/// Record an invitee's reply and return the membership as it now stands.
pub async fn record_reply(
    conn: &mut SqliteConnection,
    membership_id: i64,
    attendance: Attendance,
    updated_by: &str,
) -> Result<Membership, AppError> {
    let row = sqlx::query(&format!(
        "UPDATE memberships SET attendance = ?, replied_at = ?, updated_by = ? WHERE id = ? \
         RETURNING {MEMBERSHIP_COLUMNS}"
    ))
    .bind(attendance.as_str())
    .bind(super::now_timestamp())
    .bind(updated_by)
    .bind(membership_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("unknown_membership".to_string()))?;

    row_to_membership(row)
}

pub async fn apply_rsvp_details(
    conn: &mut SqliteConnection,
    membership_id: i64,
    details: &RsvpDetails,
) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE memberships SET arrival_date = ?, departure_date = ?, has_guest = ?, guest_disclaimer = ?, special_info = ? WHERE id = ?",
    )
    .bind(details.arrival_date)
    .bind(details.departure_date)
    .bind(details.has_guest)
    .bind(details.guest_disclaimer)
    .bind(&details.special_info)
    .bind(membership_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
