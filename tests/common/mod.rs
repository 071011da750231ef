#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use chrono::{Duration, NaiveDate};
use dashmap::DashMap;
use http::{Method, Request};
use sqlx::SqlitePool;
use tokio::sync::Notify;
use tower::ServiceExt;

use rsvpserver::db;
use rsvpserver::legacy::{LegacyConnector, LegacyError, LegacyMember, LegacyRsvp};
use rsvpserver::mailer::{Email, MailError, Mailer};
use rsvpserver::middleware::auth::{create_token_hash, generate_token};
use rsvpserver::models::event::{CreateEvent, Event};
use rsvpserver::models::invitation::{ExpiryPolicy, Invitation};
use rsvpserver::models::membership::{Attendance, CreateMembership, Membership};
use rsvpserver::models::person::{CreatePerson, Person};
use rsvpserver::models::user::User;
use rsvpserver::routes;
use rsvpserver::state::AppState;

pub const PUBLIC_URL: &str = "http://rsvp.test";

/// Legacy system stand-in. Denies every code unless told otherwise and
/// records the member updates it receives. `fail_checks` makes code checks
/// fail at the transport level.
#[derive(Default)]
pub struct FakeLegacyConnector {
    pub response: Mutex<Option<LegacyRsvp>>,
    pub checked: Mutex<Vec<String>>,
    pub updates: Mutex<Vec<LegacyMember>>,
    pub fail_checks: AtomicBool,
    pub fail_updates: AtomicBool,
}

impl FakeLegacyConnector {
    pub fn respond_with(&self, response: LegacyRsvp) {
        *self.response.lock().unwrap() = Some(response);
    }

    pub fn updates(&self) -> Vec<LegacyMember> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl LegacyConnector for FakeLegacyConnector {
    async fn check_rsvp(&self, code: &str) -> Result<LegacyRsvp, LegacyError> {
        self.checked.lock().unwrap().push(code.to_string());
        if self.fail_checks.load(Ordering::SeqCst) {
            return Err(LegacyError::ServerError {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        Ok(self
            .response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| LegacyRsvp::Denied("Invalid code".to_string())))
    }

    async fn update_member(&self, member: &LegacyMember) -> Result<(), LegacyError> {
        self.updates.lock().unwrap().push(member.clone());
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(LegacyError::ServerError {
                status: 500,
                body: "legacy is down".to_string(),
            });
        }
        Ok(())
    }
}

/// Keeps every delivered email in memory; can be switched to fail.
/// With `hold_invitations` set, invitation emails wait for `release`
/// after signalling `delivering`.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<Email>>,
    pub fail: AtomicBool,
    pub hold_invitations: AtomicBool,
    pub delivering: Notify,
    pub release: Notify,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn deliver(&self, email: &Email) -> Result<(), MailError> {
        if self.hold_invitations.load(Ordering::SeqCst) && email.subject.contains("] Invitation:")
        {
            self.delivering.notify_one();
            self.release.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError::Rejected {
                status: 503,
                body: "relay unavailable".to_string(),
            });
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// A user created for testing, bundling the User record with its raw token.
pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestUser {
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// An event with an organizer and one participant holding an invitation.
pub struct Invited {
    pub event: Event,
    pub organizer: Person,
    pub person: Person,
    pub membership: Membership,
    pub invitation: Invitation,
}

/// Test server that owns an in-memory SQLite pool and full AppState.
/// Each instance is isolated, so tests can run in parallel.
pub struct TestServer {
    pub state: AppState,
    pub legacy: Arc<FakeLegacyConnector>,
    pub mailer: Arc<RecordingMailer>,
}

pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

pub fn days(n: i64) -> NaiveDate {
    today() + Duration::days(n)
}

impl TestServer {
    pub async fn new() -> Self {
        Self::with_database("sqlite::memory:").await
    }

    /// A server backed by the given database URL, e.g. a file under the
    /// temp dir when a test needs real cross-connection locking.
    pub async fn with_database(database_url: &str) -> Self {
        let pool = db::create_pool(database_url)
            .await
            .expect("failed to create test pool");

        let legacy = Arc::new(FakeLegacyConnector::default());
        let mailer = Arc::new(RecordingMailer::default());

        let state = AppState {
            db: pool,
            legacy: legacy.clone(),
            mailer: mailer.clone(),
            public_url: PUBLIC_URL.to_string(),
            mail_from: "rsvp@rsvp.test".to_string(),
            expiry: ExpiryPolicy::default(),
            trust_proxy_headers: false,
            rate_limits: Arc::new(DashMap::new()),
        };

        Self {
            state,
            legacy,
            mailer,
        }
    }

    pub fn router(&self) -> axum::Router {
        routes::router(self.state.clone())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.state.db
    }

    pub async fn send(&self, request: Request<Body>) -> axum::response::Response {
        self.router().oneshot(request).await.unwrap()
    }

    pub async fn create_person(&self, firstname: &str, lastname: &str, email: &str) -> Person {
        db::people::create_person(
            self.pool(),
            &CreatePerson {
                firstname: firstname.to_string(),
                lastname: lastname.to_string(),
                email: email.to_string(),
                ..Default::default()
            },
        )
        .await
        .expect("failed to create test person")
    }

    /// Create an event starting `starts_in` days from today and lasting five
    /// days, organized by a freshly created person.
    pub async fn create_event(&self, code: &str, starts_in: i64) -> (Event, Person) {
        let organizer = self
            .create_person("Sofia", "Kovalevskaya", &format!("organizer+{code}@example.com"))
            .await;
        let event = db::events::create_event(
            self.pool(),
            &CreateEvent {
                code: code.to_string(),
                name: "Knots and Braids".to_string(),
                location: Some("Banff".to_string()),
                start_date: days(starts_in),
                end_date: days(starts_in + 5),
                organizer_id: organizer.id,
            },
        )
        .await
        .expect("failed to create test event");
        (event, organizer)
    }

    pub async fn add_member(
        &self,
        event_id: i64,
        person_id: i64,
        attendance: Attendance,
    ) -> Membership {
        db::memberships::create_membership(
            self.pool(),
            &CreateMembership {
                event_id,
                person_id,
                role: "Participant".to_string(),
                attendance,
            },
        )
        .await
        .expect("failed to create test membership")
    }

    pub async fn create_invitation(
        &self,
        membership_id: i64,
        code: &str,
        expires_in: i64,
    ) -> Invitation {
        let mut conn = self.pool().acquire().await.unwrap();
        db::invitations::create_invitation(
            &mut conn,
            code,
            membership_id,
            days(expires_in),
            Some("tester"),
        )
        .await
        .expect("failed to create test invitation")
    }

    /// The usual fixture: event `26w5001` a month out, Emmy Noether invited
    /// with the given attendance and a code valid for ten more days.
    pub async fn invited(&self, code: &str, attendance: Attendance) -> Invited {
        self.invited_with(code, attendance, 30, 10).await
    }

    pub async fn invited_with(
        &self,
        code: &str,
        attendance: Attendance,
        starts_in: i64,
        expires_in: i64,
    ) -> Invited {
        let (event, organizer) = self.create_event("26w5001", starts_in).await;
        let person = self
            .create_person("Emmy", "Noether", "emmy@example.com")
            .await;
        let membership = self.add_member(event.id, person.id, attendance).await;
        let invitation = self
            .create_invitation(membership.id, code, expires_in)
            .await;
        Invited {
            event,
            organizer,
            person,
            membership,
            invitation,
        }
    }

    pub async fn membership(&self, id: i64) -> Membership {
        db::memberships::get_membership(self.pool(), id)
            .await
            .unwrap()
    }

    pub async fn invitation_exists(&self, code: &str) -> bool {
        db::invitations::find_by_code(self.pool(), code)
            .await
            .unwrap()
            .is_some()
    }

    pub async fn create_user_with_token(&self, username: &str, is_admin: bool) -> TestUser {
        let user = db::users::create_user(self.pool(), username, is_admin)
            .await
            .expect("failed to create test user");

        let token = generate_token();
        db::users::insert_token(
            self.pool(),
            user.id,
            &create_token_hash(&token),
            "2099-12-31T23:59:59",
        )
        .await
        .expect("failed to insert test token");

        TestUser { user, token }
    }

    pub async fn create_admin_with_token(&self, username: &str) -> TestUser {
        self.create_user_with_token(username, true).await
    }
}

// ---------------------------------------------------------------------------
// Request builder helpers
// ---------------------------------------------------------------------------

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn authenticated_get(uri: &str, auth_header: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header("Authorization", auth_header)
        .body(Body::empty())
        .unwrap()
}

fn form_encode(fields: &[(&str, &str)]) -> String {
    serde_urlencoded::to_string(fields).unwrap()
}

/// Build an unauthenticated form POST.
pub fn form_request(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Body::from(form_encode(fields)))
        .unwrap()
}

/// Build an authenticated form POST.
pub fn authenticated_form_request(
    uri: &str,
    auth_header: &str,
    fields: &[(&str, &str)],
) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Authorization", auth_header)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Body::from(form_encode(fields)))
        .unwrap()
}

/// Parse a response body into a `serde_json::Value`.
pub async fn parse_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn location(response: &axum::response::Response) -> String {
    response
        .headers()
        .get("location")
        .expect("missing Location header")
        .to_str()
        .unwrap()
        .to_string()
}
