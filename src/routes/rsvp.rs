use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use serde_json::{json, Value};

use crate::db;
use crate::error::{AppError, Checked, FormErrors};
use crate::models::event::Event;
use crate::models::View;
use crate::rsvp::feedback::{self, FeedbackForm};
use crate::rsvp::form::{
    MessageForm, YesForm, ARRIVAL_DEPARTURE_INTRO, GUESTS_INTRO, PRIVACY_NOTICE, SPECIAL_INTRO,
};
use crate::rsvp::{feedback_path, OtpValidator, Reply, RsvpAction, RsvpWorkflow, ValidInvitation};
use crate::state::AppState;

use super::today;

fn event_summary(event: &Event) -> Value {
    json!({
        "code": event.code,
        "name": event.name,
        "location": event.location,
        "start_date": event.start_date,
        "end_date": event.end_date,
        "dates": event.dates_long(),
    })
}

fn invitation_summary(valid: &ValidInvitation) -> Value {
    json!({
        "code": valid.invitation.code,
        "greeting": format!("Dear {}:", valid.person.dear_name()),
        "event": event_summary(&valid.event),
        "organizer": {
            "name": valid.organizer.name(),
            "email": valid.organizer.email,
        },
        "attendance": valid.membership.attendance,
        "expires": valid.invitation.expire_date(),
    })
}

fn with_fields(mut base: Value, extra: Value) -> Value {
    if let (Some(base), Value::Object(extra)) = (base.as_object_mut(), extra) {
        base.extend(extra);
    }
    base
}

async fn validate(state: &AppState, code: &str) -> Result<ValidInvitation, AppError> {
    OtpValidator::from_state(state).validate(code, today()).await
}

/// `/rsvp` without a code: send people to request an invitation.
pub async fn missing_code() -> Redirect {
    Redirect::to("/invitations/new")
}

pub async fn index(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<View<Value>>, AppError> {
    let valid = validate(&state, &code).await?;
    let code = &valid.invitation.code;
    let data = with_fields(
        invitation_summary(&valid),
        json!({
            "links": {
                "yes": format!("/rsvp/{code}/yes"),
                "no": format!("/rsvp/{code}/no"),
                "maybe": format!("/rsvp/{code}/maybe"),
            }
        }),
    );
    Ok(Json(View::new("rsvp/index", data)))
}

pub async fn no_form(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<View<Value>>, AppError> {
    let valid = validate(&state, &code).await?;
    let data = with_fields(
        invitation_summary(&valid),
        json!({
            "action": format!("/rsvp/{}/no", valid.invitation.code),
            "submit": "Decline Attendance",
        }),
    );
    Ok(Json(View::new("rsvp/no", data)))
}

pub async fn no(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Form(form): Form<MessageForm>,
) -> Result<Redirect, AppError> {
    let valid = validate(&state, &code).await?;
    let outcome = RsvpWorkflow::from_state(&state)
        .respond(
            valid,
            RsvpAction::No,
            Reply::with_message(form.organizer_message),
        )
        .await?;
    Ok(Redirect::to(&feedback_path(outcome.membership_id)))
}

pub async fn maybe_form(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<View<Value>>, AppError> {
    let valid = validate(&state, &code).await?;
    let data = with_fields(
        invitation_summary(&valid),
        json!({
            "notice": format!(
                "Thanks for letting us know. You can come back and reply until {}.",
                valid.invitation.expire_date()
            ),
            "action": format!("/rsvp/{}/maybe", valid.invitation.code),
            "submit": "Send Reply",
        }),
    );
    Ok(Json(View::new("rsvp/maybe", data)))
}

pub async fn maybe(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Form(form): Form<MessageForm>,
) -> Result<Redirect, AppError> {
    let valid = validate(&state, &code).await?;
    let outcome = RsvpWorkflow::from_state(&state)
        .respond(
            valid,
            RsvpAction::Maybe,
            Reply::with_message(form.organizer_message),
        )
        .await?;
    Ok(Redirect::to(&feedback_path(outcome.membership_id)))
}

fn yes_view(valid: &ValidInvitation, form: &YesForm, errors: &FormErrors) -> View<Value> {
    let data = with_fields(
        invitation_summary(valid),
        json!({
            "intros": {
                "arrival_departure": ARRIVAL_DEPARTURE_INTRO,
                "guests": GUESTS_INTRO,
                "special": SPECIAL_INTRO,
            },
            "privacy_notice": PRIVACY_NOTICE,
            "form": form,
            "errors": errors,
            "action": format!("/rsvp/{}/yes", valid.invitation.code),
            "submit": "Confirm Attendance",
        }),
    );
    View::new("rsvp/yes", data)
}

pub async fn yes_form(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<View<Value>>, AppError> {
    let valid = validate(&state, &code).await?;
    let form = YesForm::prefilled(&valid.person, &valid.membership);
    Ok(Json(yes_view(&valid, &form, &FormErrors::new())))
}

pub async fn yes(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Form(form): Form<YesForm>,
) -> Result<Response, AppError> {
    let valid = validate(&state, &code).await?;

    let confirmation = match form.check(&state.db, &valid.event, &valid.person).await? {
        Checked::Valid(confirmation) => confirmation,
        Checked::Invalid(errors) => {
            let view = yes_view(&valid, &form, &errors);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(view)).into_response());
        }
    };

    let reply = Reply {
        message: confirmation.message,
        person: Some(confirmation.person),
        details: Some(confirmation.details),
    };
    let outcome = RsvpWorkflow::from_state(&state)
        .respond(valid, RsvpAction::Yes, reply)
        .await?;
    Ok(Redirect::to(&feedback_path(outcome.membership_id)).into_response())
}

pub async fn feedback_form(
    State(state): State<AppState>,
    Path(membership_id): Path<i64>,
) -> Result<Json<View<Value>>, AppError> {
    let membership = db::memberships::get_membership(&state.db, membership_id).await?;
    let event = db::events::get_event(&state.db, membership.event_id).await?;
    let person = db::people::get_person(&state.db, membership.person_id).await?;

    let data = json!({
        "membership_id": membership.id,
        "attendance": membership.attendance,
        "greeting": format!("Dear {}:", person.dear_name()),
        "notice": "Thank you for your reply.",
        "event": event_summary(&event),
        "action": feedback_path(membership.id),
        "submit": "Send Feedback",
    });
    Ok(Json(View::new("rsvp/feedback", data)))
}

pub async fn feedback(
    State(state): State<AppState>,
    Path(membership_id): Path<i64>,
    Form(form): Form<FeedbackForm>,
) -> Result<Redirect, AppError> {
    let membership = db::memberships::get_membership(&state.db, membership_id).await?;
    let event = db::events::get_event(&state.db, membership.event_id).await?;
    feedback::record(&state.db, membership.id, &form).await?;
    Ok(Redirect::to(&format!("/events/{}/memberships", event.code)))
}
