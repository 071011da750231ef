use axum::extract::State;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use serde_json::{json, Value};

use crate::db;
use crate::error::{AppError, Checked, FormErrors};
use crate::invitations::{InvitationForm, InvitationIssuer};
use crate::middleware::auth::AdminUser;
use crate::models::View;
use crate::state::AppState;

use super::today;

const FLASH_COOKIE: &str = "flash";

fn flash_cookie(message: &str) -> String {
    let value = data_encoding::BASE64URL_NOPAD.encode(message.as_bytes());
    format!("{FLASH_COOKIE}={value}; Path=/invitations; Max-Age=60; HttpOnly; SameSite=Lax")
}

fn clear_flash_cookie() -> String {
    format!("{FLASH_COOKIE}=; Path=/invitations; Max-Age=0; HttpOnly; SameSite=Lax")
}

/// Pull the flash message out of the request cookies, if any.
pub(crate) fn read_flash(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == FLASH_COOKIE && !value.is_empty())
        .and_then(|(_, value)| data_encoding::BASE64URL_NOPAD.decode(value.as_bytes()).ok())
        .and_then(|bytes| String::from_utf8(bytes).ok())
}

async fn form_view(
    state: &AppState,
    form: &InvitationForm,
    errors: &FormErrors,
    flash: Option<String>,
) -> Result<View<Value>, AppError> {
    let events = db::events::list_future(&state.db, today()).await?;
    let events: Vec<Value> = events
        .iter()
        .map(|e| {
            json!({
                "code": e.code,
                "name": e.name,
                "dates": e.dates_long(),
            })
        })
        .collect();

    Ok(View::new(
        "invitations/new",
        json!({
            "events": events,
            "form": form,
            "errors": errors,
            "flash": flash.map(|notice| json!({ "notice": notice })),
            "action": "/invitations",
            "submit": "Send Invitation",
        }),
    ))
}

pub async fn index() -> Redirect {
    Redirect::to("/invitations/new")
}

pub async fn new(
    State(state): State<AppState>,
    _admin: AdminUser,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let flash = read_flash(&headers);
    let had_flash = flash.is_some();
    let view = form_view(&state, &InvitationForm::default(), &FormErrors::new(), flash).await?;

    let mut response = Json(view).into_response();
    if had_flash {
        if let Ok(value) = clear_flash_cookie().parse() {
            response.headers_mut().insert(SET_COOKIE, value);
        }
    }
    Ok(response)
}

pub async fn create(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Form(form): Form<InvitationForm>,
) -> Result<Response, AppError> {
    let issued = match InvitationIssuer::from_state(&state)
        .issue(&form, &admin.username, today())
        .await?
    {
        Checked::Valid(issued) => issued,
        Checked::Invalid(errors) => {
            let view = form_view(&state, &form, &errors, None).await?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(view)).into_response());
        }
    };

    let notice = format!(
        "Invitation sent to {} <{}> for {}.",
        issued.person.name(),
        issued.person.email,
        issued.event.code
    );
    let mut response = Redirect::to("/invitations/new").into_response();
    let cookie = flash_cookie(&notice)
        .parse()
        .map_err(|_| AppError::Internal("invalid flash cookie".to_string()))?;
    response.headers_mut().insert(SET_COOKIE, cookie);
    Ok(response)
}
