use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};

use crate::error::AppError;
use crate::models::event::{CreateEvent, Event};

fn row_to_event(row: sqlx::sqlite::SqliteRow) -> Event {
    Event {
        id: row.get("id"),
        code: row.get("code"),
        name: row.get("name"),
        location: row.get("location"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        organizer_id: row.get("organizer_id"),
    }
}

const SELECT_EVENTS: &str =
    "SELECT id, code, name, location, start_date, end_date, organizer_id FROM events";

pub async fn get_event(pool: &SqlitePool, event_id: i64) -> Result<Event, AppError> {
    let row = sqlx::query(&format!("{SELECT_EVENTS} WHERE id = ?"))
        .bind(event_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("unknown_event".to_string()))?;

    Ok(row_to_event(row))
}

pub async fn find_by_code(pool: &SqlitePool, code: &str) -> Result<Option<Event>, AppError> {
    let row = sqlx::query(&format!("{SELECT_EVENTS} WHERE code = ?"))
        .bind(code.trim())
        .fetch_optional(pool)
        .await?;

    Ok(row.map(row_to_event))
}

/// Events that have not started yet, soonest first.
pub async fn list_future(pool: &SqlitePool, today: NaiveDate) -> Result<Vec<Event>, AppError> {
    let rows = sqlx::query(&format!(
        "{SELECT_EVENTS} WHERE start_date > ? ORDER BY start_date ASC, code ASC"
    ))
    .bind(today)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(row_to_event).collect())
}

pub async fn create_event(pool: &SqlitePool, input: &CreateEvent) -> Result<Event, AppError> {
    if input.end_date < input.start_date {
        return Err(AppError::BadRequest(
            "event must not end before it starts".to_string(),
        ));
    }

    let id = sqlx::query(
        "INSERT INTO events (code, name, location, start_date, end_date, organizer_id) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&input.code)
    .bind(&input.name)
    .bind(&input.location)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(input.organizer_id)
    .execute(pool)
    .await?
    .last_insert_rowid();

    get_event(pool, id).await
}
