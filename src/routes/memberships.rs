use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::db;
use crate::error::AppError;
use crate::models::membership::Attendance;
use crate::models::View;
use crate::state::AppState;

/// Event members grouped by attendance, in `Attendance::ALL` order. Empty
/// groups are left out.
pub async fn list_memberships(
    State(state): State<AppState>,
    Path(event_code): Path<String>,
) -> Result<Json<View<Value>>, AppError> {
    let event = db::events::find_by_code(&state.db, &event_code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no event with code {event_code}")))?;

    let memberships = db::memberships::list_for_event(&state.db, event.id).await?;
    let mut rows = Vec::with_capacity(memberships.len());
    for membership in memberships {
        let person = db::people::get_person(&state.db, membership.person_id).await?;
        rows.push((membership, person));
    }

    let groups: Vec<Value> = Attendance::ALL
        .iter()
        .filter_map(|attendance| {
            let members: Vec<Value> = rows
                .iter()
                .filter(|(m, _)| m.attendance == *attendance)
                .map(|(m, p)| {
                    json!({
                        "membership_id": m.id,
                        "name": p.name(),
                        "affiliation": p.affiliation,
                        "role": m.role,
                    })
                })
                .collect();
            (!members.is_empty()).then(|| {
                json!({
                    "attendance": attendance,
                    "count": members.len(),
                    "members": members,
                })
            })
        })
        .collect();

    Ok(Json(View::new(
        "memberships/index",
        json!({
            "event": {
                "code": event.code,
                "name": event.name,
                "dates": event.dates_long(),
            },
            "groups": groups,
        }),
    )))
}
