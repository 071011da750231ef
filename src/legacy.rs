//! Connector to the legacy system of record.
//!
//! The legacy database still knows about invitation codes issued before
//! this service existed, and it mirrors every attendance change. Both
//! directions are treated as unreliable: callers degrade a failed lookup
//! to "invalid code" and only log failed updates.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::models::event::Event;
use crate::models::membership::{Attendance, Membership};
use crate::models::person::Person;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub enum LegacyError {
    Http(reqwest::Error),
    ServerError { status: u16, body: String },
    Decode(String),
}

impl fmt::Display for LegacyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegacyError::Http(e) => write!(f, "HTTP error: {e}"),
            LegacyError::ServerError { status, body } => {
                write!(f, "legacy server returned {status}: {body}")
            }
            LegacyError::Decode(e) => write!(f, "unexpected legacy response: {e}"),
        }
    }
}

impl std::error::Error for LegacyError {}

impl From<reqwest::Error> for LegacyError {
    fn from(e: reqwest::Error) -> Self {
        LegacyError::Http(e)
    }
}

/// Membership the legacy system associates with an invitation code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyMembership {
    pub event_code: String,
    pub email: String,
    #[serde(default)]
    pub expires: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyRsvp {
    Member(LegacyMembership),
    Denied(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CheckRsvpResponse {
    Denied { denied: String },
    Member(LegacyMembership),
}

impl From<CheckRsvpResponse> for LegacyRsvp {
    fn from(response: CheckRsvpResponse) -> Self {
        match response {
            CheckRsvpResponse::Denied { denied } => LegacyRsvp::Denied(denied),
            CheckRsvpResponse::Member(member) => LegacyRsvp::Member(member),
        }
    }
}

/// Snapshot of a membership pushed to the legacy system after a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegacyMember {
    pub event_code: String,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub affiliation: Option<String>,
    pub attendance: Attendance,
    pub arrival_date: Option<NaiveDate>,
    pub departure_date: Option<NaiveDate>,
    pub has_guest: bool,
    pub special_info: Option<String>,
    pub replied_at: Option<String>,
    pub updated_by: Option<String>,
}

impl LegacyMember {
    pub fn new(event: &Event, person: &Person, membership: &Membership) -> Self {
        Self {
            event_code: event.code.clone(),
            email: person.email.clone(),
            firstname: person.firstname.clone(),
            lastname: person.lastname.clone(),
            affiliation: person.affiliation.clone(),
            attendance: membership.attendance,
            arrival_date: membership.arrival_date,
            departure_date: membership.departure_date,
            has_guest: membership.has_guest,
            special_info: membership.special_info.clone(),
            replied_at: membership.replied_at.clone(),
            updated_by: membership.updated_by.clone(),
        }
    }
}

#[async_trait]
pub trait LegacyConnector: Send + Sync {
    /// Ask the legacy system whether it issued `code`.
    async fn check_rsvp(&self, code: &str) -> Result<LegacyRsvp, LegacyError>;

    /// Mirror a membership change into the legacy system.
    async fn update_member(&self, member: &LegacyMember) -> Result<(), LegacyError>;
}

/// Used when no legacy system is configured: knows no codes, accepts all updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalOnlyConnector;

#[async_trait]
impl LegacyConnector for LocalOnlyConnector {
    async fn check_rsvp(&self, _code: &str) -> Result<LegacyRsvp, LegacyError> {
        Ok(LegacyRsvp::Denied("Invalid code".to_string()))
    }

    async fn update_member(&self, member: &LegacyMember) -> Result<(), LegacyError> {
        tracing::debug!(
            event = %member.event_code,
            attendance = %member.attendance,
            "no legacy system configured, skipping member update"
        );
        Ok(())
    }
}

pub struct HttpLegacyConnector {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpLegacyConnector {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            auth_token: None,
        }
    }

    pub fn with_auth_token(mut self, token: String) -> Self {
        self.auth_token = Some(token);
        self
    }

    fn apply_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(ref token) = self.auth_token {
            builder.header("Authorization", format!("Bearer {token}"))
        } else {
            builder
        }
    }

    fn url(&self, segments: &[&str]) -> Result<Url, LegacyError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| LegacyError::Decode(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| LegacyError::Decode(format!("bad legacy base url: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl LegacyConnector for HttpLegacyConnector {
    async fn check_rsvp(&self, code: &str) -> Result<LegacyRsvp, LegacyError> {
        let url = self.url(&["rsvp", code])?;
        let builder = self.client.get(url).timeout(REQUEST_TIMEOUT);
        let resp = self.apply_auth(builder).send().await?;

        let status = resp.status();
        let body = resp.text().await?;

        if status.is_success() || status == StatusCode::NOT_FOUND || status == StatusCode::FORBIDDEN
        {
            return match serde_json::from_str::<CheckRsvpResponse>(&body) {
                Ok(parsed) => Ok(parsed.into()),
                Err(_) if !status.is_success() => Ok(LegacyRsvp::Denied("Invalid code".to_string())),
                Err(e) => Err(LegacyError::Decode(e.to_string())),
            };
        }

        Err(LegacyError::ServerError {
            status: status.as_u16(),
            body,
        })
    }

    async fn update_member(&self, member: &LegacyMember) -> Result<(), LegacyError> {
        let url = self.url(&["events", &member.event_code, "members"])?;
        let builder = self.client.put(url).timeout(REQUEST_TIMEOUT).json(member);
        let resp = self.apply_auth(builder).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(LegacyError::ServerError { status, body });
        }

        Ok(())
    }
}
