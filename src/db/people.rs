use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::error::AppError;
use crate::models::person::{CreatePerson, Person, UpdatePerson};

fn row_to_person(row: sqlx::sqlite::SqliteRow) -> Person {
    Person {
        id: row.get("id"),
        salutation: row.get("salutation"),
        firstname: row.get("firstname"),
        lastname: row.get("lastname"),
        email: row.get("email"),
        affiliation: row.get("affiliation"),
        department: row.get("department"),
        title: row.get("title"),
        url: row.get("url"),
        phone: row.get("phone"),
        address1: row.get("address1"),
        city: row.get("city"),
        region: row.get("region"),
        country: row.get("country"),
        postal_code: row.get("postal_code"),
        biography: row.get("biography"),
        research_areas: row.get("research_areas"),
    }
}

const PERSON_COLUMNS: &str = "id, salutation, firstname, lastname, email, affiliation, department, title, url, phone, address1, city, region, country, postal_code, biography, research_areas";
const SELECT_PEOPLE: &str = "SELECT id, salutation, firstname, lastname, email, affiliation, department, title, url, phone, address1, city, region, country, postal_code, biography, research_areas FROM people";

pub async fn get_person(pool: &SqlitePool, person_id: i64) -> Result<Person, AppError> {
    let row = sqlx::query(&format!("{SELECT_PEOPLE} WHERE id = ?"))
        .bind(person_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("unknown_person".to_string()))?;

    Ok(row_to_person(row))
}

/// Email lookup is case-insensitive (the column is `COLLATE NOCASE`).
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Person>, AppError> {
    let row = sqlx::query(&format!("{SELECT_PEOPLE} WHERE email = ?"))
        .bind(email.trim())
        .fetch_optional(pool)
        .await?;

    Ok(row.map(row_to_person))
}

pub async fn create_person(pool: &SqlitePool, input: &CreatePerson) -> Result<Person, AppError> {
    let id = sqlx::query(
        "INSERT INTO people (salutation, firstname, lastname, email, affiliation) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&input.salutation)
    .bind(&input.firstname)
    .bind(&input.lastname)
    .bind(input.email.trim())
    .bind(&input.affiliation)
    .execute(pool)
    .await?
    .last_insert_rowid();

    get_person(pool, id).await
}

/// Apply the non-`None` fields of `input`. Blank optional fields are cleared.
/// Returns the person as stored afterwards.
pub async fn update_person(
    conn: &mut SqliteConnection,
    person_id: i64,
    input: &UpdatePerson,
) -> Result<Person, AppError> {
    let fields: [(&str, &Option<String>); 15] = [
        ("firstname", &input.firstname),
        ("lastname", &input.lastname),
        ("email", &input.email),
        ("affiliation", &input.affiliation),
        ("department", &input.department),
        ("title", &input.title),
        ("url", &input.url),
        ("phone", &input.phone),
        ("address1", &input.address1),
        ("city", &input.city),
        ("region", &input.region),
        ("country", &input.country),
        ("postal_code", &input.postal_code),
        ("biography", &input.biography),
        ("research_areas", &input.research_areas),
    ];

    let mut sets = Vec::new();
    let mut values: Vec<Option<String>> = Vec::new();
    for (column, value) in fields {
        if let Some(value) = value {
            let value = value.trim();
            sets.push(format!("{column} = ?"));
            values.push(if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            });
        }
    }

    let sql = if sets.is_empty() {
        format!("{SELECT_PEOPLE} WHERE id = ?")
    } else {
        format!(
            "UPDATE people SET {}, updated_at = strftime('%Y-%m-%dT%H:%M:%S', 'now') WHERE id = ? \
             RETURNING {PERSON_COLUMNS}",
            sets.join(", ")
        )
    };
    let mut query = sqlx::query(&sql);
    for value in &values {
        query = query.bind(value.as_deref());
    }
    let row = query
        .bind(person_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("unknown_person".to_string()))?;

    Ok(row_to_person(row))
}
