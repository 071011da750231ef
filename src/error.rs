use std::collections::BTreeMap;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::models::View;

#[derive(Debug)]
pub enum AppError {
    Database(sqlx::Error),
    Internal(String),
    BadRequest(String),
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    RateLimited { retry_after: u64 },
    Invitation(InvitationError),
}

/// Reasons an invitation code cannot be used. Rendered to the invitee
/// through the `rsvp/invitation_errors` view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvitationError {
    InvalidCode(String),
    Expired,
    PastEvent,
    NotYetInvited,
    AlreadyDeclined,
}

impl InvitationError {
    pub fn code(&self) -> &'static str {
        match self {
            InvitationError::InvalidCode(_) => "invalid_code",
            InvitationError::Expired => "expired_invitation",
            InvitationError::PastEvent => "past_event",
            InvitationError::NotYetInvited => "not_yet_invited",
            InvitationError::AlreadyDeclined => "already_declined",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            InvitationError::InvalidCode(_) => StatusCode::NOT_FOUND,
            InvitationError::Expired => StatusCode::GONE,
            InvitationError::PastEvent => StatusCode::GONE,
            InvitationError::NotYetInvited => StatusCode::FORBIDDEN,
            InvitationError::AlreadyDeclined => StatusCode::CONFLICT,
        }
    }

    pub fn message(&self) -> String {
        match self {
            InvitationError::InvalidCode(reason) => reason.clone(),
            InvitationError::Expired => "This invitation code is expired.".to_string(),
            InvitationError::PastEvent => "You cannot RSVP for past events.".to_string(),
            InvitationError::NotYetInvited => "The event's organizers have not yet invited you. \
                 Please contact them if you wish to attend."
                .to_string(),
            InvitationError::AlreadyDeclined => "You have already declined an invitation to this \
                 event. Please contact the event's organizers to ask if it is still possible \
                 to attend."
                .to_string(),
        }
    }
}

impl fmt::Display for InvitationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl IntoResponse for InvitationError {
    fn into_response(self) -> Response {
        let view = View::new(
            "rsvp/invitation_errors",
            json!({
                "error": {
                    "code": self.code(),
                    "message": self.message()
                }
            }),
        );
        (self.status(), Json(view)).into_response()
    }
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "internal_error",
            AppError::Internal(_) => "internal_error",
            AppError::BadRequest(_) => "invalid_request",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::RateLimited { .. } => "rate_limited",
            AppError::Invitation(e) => e.code(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Invitation(e) => e.status(),
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Database(e) => {
                tracing::error!("database error: {e}");
                "internal database error".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("internal error: {e}");
                "internal server error".to_string()
            }
            AppError::BadRequest(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Unauthorized(msg) => msg.clone(),
            AppError::Forbidden(msg) => msg.clone(),
            AppError::RateLimited { retry_after } => {
                format!("rate limited, retry after {retry_after}s")
            }
            AppError::Invitation(e) => e.message(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Invitation(e) = self {
            return e.into_response();
        }

        let status = self.status();
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.message()
            }
        });

        let mut response = (status, Json(body)).into_response();
        if let AppError::RateLimited { retry_after } = &self {
            response
                .headers_mut()
                .insert("Retry-After", (*retry_after).into());
        }
        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => AppError::NotFound("resource not found".to_string()),
            _ => AppError::Database(e),
        }
    }
}

impl From<InvitationError> for AppError {
    fn from(e: InvitationError) -> Self {
        AppError::Invitation(e)
    }
}

/// Per-field validation messages for a submitted form, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Outcome of checking submitted input that may need to be re-rendered.
#[derive(Debug)]
pub enum Checked<T> {
    Valid(T),
    Invalid(FormErrors),
}

/// Loose structural email check: one `@`, non-empty local part, dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
