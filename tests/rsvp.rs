mod common;

use std::net::SocketAddr;
use std::sync::atomic::Ordering;

use axum::extract::ConnectInfo;

use common::{days, form_request, get, location, parse_body, TestServer};
use http::StatusCode;
use rsvpserver::db;
use rsvpserver::legacy::{LegacyMembership, LegacyRsvp};
use rsvpserver::models::membership::Attendance;
use rsvpserver::rsvp::{OtpValidator, Reply, RsvpAction, RsvpWorkflow};
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Landing page and code validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_landing_page_for_valid_code() {
    let server = TestServer::new().await;
    let invited = server
        .invited_with("ABC123", Attendance::Invited, 30, 1)
        .await;

    let response = server.send(get("/rsvp/ABC123")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_body(response).await;
    assert_eq!(body["view"], "rsvp/index");
    assert_eq!(body["data"]["greeting"], "Dear Emmy Noether:");
    assert_eq!(body["data"]["event"]["code"], "26w5001");
    assert_eq!(body["data"]["event"]["dates"], invited.event.dates_long());
    assert_eq!(body["data"]["organizer"]["name"], "Sofia Kovalevskaya");
    assert_eq!(body["data"]["links"]["yes"], "/rsvp/ABC123/yes");
    assert_eq!(body["data"]["links"]["no"], "/rsvp/ABC123/no");
    assert_eq!(body["data"]["links"]["maybe"], "/rsvp/ABC123/maybe");
    assert_eq!(body["data"]["expires"], invited.invitation.expire_date());
}

#[tokio::test]
async fn test_missing_code_redirects_to_invitation_form() {
    let server = TestServer::new().await;
    for uri in ["/rsvp", "/rsvp/"] {
        let response = server.send(get(uri)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/invitations/new");
    }
}

#[tokio::test]
async fn test_unknown_code_asks_legacy_then_fails() {
    let server = TestServer::new().await;

    let response = server.send(get("/rsvp/NOPE")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = parse_body(response).await;
    assert_eq!(body["view"], "rsvp/invitation_errors");
    assert_eq!(body["data"]["error"]["code"], "invalid_code");
    assert_eq!(body["data"]["error"]["message"], "Invalid code");
    assert_eq!(*server.legacy.checked.lock().unwrap(), vec!["NOPE".to_string()]);
}

#[tokio::test]
async fn test_unreachable_legacy_counts_as_invalid_code() {
    let server = TestServer::new().await;
    server.legacy.fail_checks.store(true, Ordering::SeqCst);

    let response = server.send(get("/rsvp/LEGACYDOWN")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = parse_body(response).await;
    assert_eq!(body["view"], "rsvp/invitation_errors");
    assert_eq!(body["data"]["error"]["code"], "invalid_code");
    assert_eq!(body["data"]["error"]["message"], "Invalid code");
    assert_eq!(
        *server.legacy.checked.lock().unwrap(),
        vec!["LEGACYDOWN".to_string()]
    );
    assert!(!server.invitation_exists("LEGACYDOWN").await);
}

#[tokio::test]
async fn test_legacy_denial_reason_is_shown() {
    let server = TestServer::new().await;
    server
        .legacy
        .respond_with(LegacyRsvp::Denied("This code was revoked".to_string()));

    let response = server.send(get("/rsvp/REVOKED")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = parse_body(response).await;
    assert_eq!(body["data"]["error"]["message"], "This code was revoked");
}

#[tokio::test]
async fn test_expired_code() {
    let server = TestServer::new().await;
    server
        .invited_with("ABC123", Attendance::Invited, 30, -1)
        .await;

    let response = server.send(get("/rsvp/ABC123")).await;
    assert_eq!(response.status(), StatusCode::GONE);
    let body = parse_body(response).await;
    assert_eq!(body["data"]["error"]["code"], "expired_invitation");
    assert_eq!(body["data"]["error"]["message"], "This invitation code is expired.");
}

#[tokio::test]
async fn test_expired_local_code_ignores_legacy() {
    let server = TestServer::new().await;
    server
        .invited_with("ABC123", Attendance::Invited, 30, -1)
        .await;
    server.legacy.respond_with(LegacyRsvp::Member(LegacyMembership {
        event_code: "26w5001".to_string(),
        email: "emmy@example.com".to_string(),
        expires: Some(days(20)),
    }));

    let response = server.send(get("/rsvp/ABC123")).await;
    assert_eq!(response.status(), StatusCode::GONE);
    assert!(server.legacy.checked.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_code_expiring_today_still_works() {
    let server = TestServer::new().await;
    server
        .invited_with("ABC123", Attendance::Invited, 30, 0)
        .await;

    let response = server.send(get("/rsvp/ABC123")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_past_event_takes_precedence_over_expiry() {
    let server = TestServer::new().await;
    // Event ended yesterday, code expired a week ago, invitee declined.
    server
        .invited_with("ABC123", Attendance::Declined, -6, -7)
        .await;

    let response = server.send(get("/rsvp/ABC123")).await;
    assert_eq!(response.status(), StatusCode::GONE);
    let body = parse_body(response).await;
    assert_eq!(body["data"]["error"]["code"], "past_event");
    assert_eq!(body["data"]["error"]["message"], "You cannot RSVP for past events.");
}

#[tokio::test]
async fn test_not_yet_invited_member() {
    let server = TestServer::new().await;
    server.invited("ABC123", Attendance::NotYetInvited).await;

    let response = server.send(get("/rsvp/ABC123/yes")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = parse_body(response).await;
    assert_eq!(body["data"]["error"]["code"], "not_yet_invited");
}

#[tokio::test]
async fn test_declined_member_cannot_reply_again() {
    let server = TestServer::new().await;
    server.invited("ABC123", Attendance::Declined).await;

    let response = server
        .send(form_request("/rsvp/ABC123/yes", &[("firstname", "Emmy")]))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = parse_body(response).await;
    assert_eq!(body["data"]["error"]["code"], "already_declined");
    assert!(server.mailer.sent().is_empty());
}

// ---------------------------------------------------------------------------
// Legacy fallback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_legacy_code_is_attached_locally() {
    let server = TestServer::new().await;
    let (event, _) = server.create_event("26w5001", 30).await;
    let person = server
        .create_person("Emmy", "Noether", "emmy@example.com")
        .await;
    let membership = server
        .add_member(event.id, person.id, Attendance::Invited)
        .await;
    server.legacy.respond_with(LegacyRsvp::Member(LegacyMembership {
        event_code: "26w5001".to_string(),
        email: "EMMY@example.com".to_string(),
        expires: None,
    }));

    let response = server.send(get("/rsvp/LEGACY1")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let invitation = db::invitations::find_by_code(server.pool(), "LEGACY1")
        .await
        .unwrap()
        .expect("legacy code should now exist locally");
    assert_eq!(invitation.membership_id, membership.id);
    assert_eq!(invitation.invited_by.as_deref(), Some("legacy"));
    // 28 days before a start 30 days out is sooner than the 7 day minimum.
    assert_eq!(invitation.expires, days(7));

    // Second visit is served locally.
    let response = server.send(get("/rsvp/LEGACY1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(server.legacy.checked.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_legacy_code_keeps_its_expiry() {
    let server = TestServer::new().await;
    let (event, _) = server.create_event("26w5001", 30).await;
    let person = server
        .create_person("Emmy", "Noether", "emmy@example.com")
        .await;
    server
        .add_member(event.id, person.id, Attendance::Invited)
        .await;
    server.legacy.respond_with(LegacyRsvp::Member(LegacyMembership {
        event_code: "26w5001".to_string(),
        email: "emmy@example.com".to_string(),
        expires: Some(days(-2)),
    }));

    let response = server.send(get("/rsvp/LEGACY1")).await;
    assert_eq!(response.status(), StatusCode::GONE);
}

#[tokio::test]
async fn test_legacy_member_unknown_here_is_invalid() {
    let server = TestServer::new().await;
    server.create_event("26w5001", 30).await;
    server.legacy.respond_with(LegacyRsvp::Member(LegacyMembership {
        event_code: "26w5001".to_string(),
        email: "stranger@example.com".to_string(),
        expires: None,
    }));

    let response = server.send(get("/rsvp/LEGACY1")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(!server.invitation_exists("LEGACY1").await);
}

// ---------------------------------------------------------------------------
// No / Maybe
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_no_form() {
    let server = TestServer::new().await;
    server.invited("ABC123", Attendance::Invited).await;

    let response = server.send(get("/rsvp/ABC123/no")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_body(response).await;
    assert_eq!(body["view"], "rsvp/no");
    assert_eq!(body["data"]["action"], "/rsvp/ABC123/no");
}

#[tokio::test]
async fn test_decline_with_message() {
    let server = TestServer::new().await;
    let invited = server.invited("ABC123", Attendance::Invited).await;

    let response = server
        .send(form_request(
            "/rsvp/ABC123/no",
            &[("organizer_message", "sorry, I have a conflict")],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        format!("/rsvp/feedback/{}", invited.membership.id)
    );

    let membership = server.membership(invited.membership.id).await;
    assert_eq!(membership.attendance, Attendance::Declined);
    assert_eq!(membership.updated_by.as_deref(), Some("RSVP"));
    assert!(membership.replied_at.is_some());
    assert!(!server.invitation_exists("ABC123").await);

    let sent = server.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec![invited.organizer.email.clone()]);
    assert_eq!(sent[0].subject, "[26w5001] Emmy Noether replied: No");
    assert!(sent[0].body.contains("sorry, I have a conflict"));

    let updates = server.legacy.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].attendance, Attendance::Declined);
    assert_eq!(updates[0].email, "emmy@example.com");
}

#[tokio::test]
async fn test_code_is_gone_after_declining() {
    let server = TestServer::new().await;
    server.invited("ABC123", Attendance::Invited).await;

    let response = server.send(form_request("/rsvp/ABC123/no", &[])).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = server.send(get("/rsvp/ABC123")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = parse_body(response).await;
    assert_eq!(body["data"]["error"]["code"], "invalid_code");
}

#[tokio::test]
async fn test_maybe_keeps_the_code() {
    let server = TestServer::new().await;
    let invited = server.invited("ABC123", Attendance::Invited).await;

    let response = server.send(get("/rsvp/ABC123/maybe")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_body(response).await;
    assert_eq!(body["view"], "rsvp/maybe");
    assert!(body["data"]["notice"]
        .as_str()
        .unwrap()
        .contains(&invited.invitation.expire_date()));

    let response = server
        .send(form_request("/rsvp/ABC123/maybe", &[("organizer_message", "")]))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let membership = server.membership(invited.membership.id).await;
    assert_eq!(membership.attendance, Attendance::Undecided);
    assert!(server.invitation_exists("ABC123").await);

    let sent = server.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.contains("did not include a message"));

    // Still usable for a later answer.
    let response = server.send(get("/rsvp/ABC123")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Yes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_yes_form_is_prefilled() {
    let server = TestServer::new().await;
    server.invited("ABC123", Attendance::Invited).await;

    let response = server.send(get("/rsvp/ABC123/yes")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_body(response).await;
    assert_eq!(body["view"], "rsvp/yes");
    assert_eq!(body["data"]["form"]["firstname"], "Emmy");
    assert_eq!(body["data"]["form"]["email"], "emmy@example.com");
    assert!(body["data"]["privacy_notice"].is_string());
    assert!(body["data"]["intros"]["guests"].is_string());
    assert_eq!(body["data"]["errors"], serde_json::json!({}));
}

#[tokio::test]
async fn test_confirm_attendance() {
    let server = TestServer::new().await;
    let invited = server.invited("ABC123", Attendance::Invited).await;
    let arrival = (invited.event.start_date + chrono::Duration::days(1)).to_string();
    let departure = invited.event.end_date.to_string();

    let response = server
        .send(form_request(
            "/rsvp/ABC123/yes",
            &[
                ("arrival_date", arrival.as_str()),
                ("departure_date", departure.as_str()),
                ("special_info", "Vegetarian"),
                ("affiliation", "Institute for Advanced Study"),
                ("organizer_message", "Looking forward to it"),
            ],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        format!("/rsvp/feedback/{}", invited.membership.id)
    );

    let membership = server.membership(invited.membership.id).await;
    assert_eq!(membership.attendance, Attendance::Confirmed);
    assert_eq!(membership.arrival_date.map(|d| d.to_string()), Some(arrival));
    assert_eq!(membership.special_info.as_deref(), Some("Vegetarian"));
    assert!(!server.invitation_exists("ABC123").await);

    let person = db::people::get_person(server.pool(), invited.person.id)
        .await
        .unwrap();
    assert_eq!(person.affiliation.as_deref(), Some("Institute for Advanced Study"));

    let sent = server.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "[26w5001] Emmy Noether replied: Yes");
    assert!(sent[0].body.contains("Looking forward to it"));

    let updates = server.legacy.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].attendance, Attendance::Confirmed);
    assert_eq!(updates[0].affiliation.as_deref(), Some("Institute for Advanced Study"));
}

#[tokio::test]
async fn test_confirm_survives_legacy_failure() {
    let server = TestServer::new().await;
    let invited = server.invited("ABC123", Attendance::Undecided).await;
    server.legacy.fail_updates.store(true, Ordering::SeqCst);

    let response = server.send(form_request("/rsvp/ABC123/yes", &[])).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let membership = server.membership(invited.membership.id).await;
    assert_eq!(membership.attendance, Attendance::Confirmed);
    assert_eq!(server.legacy.updates().len(), 1);
    assert_eq!(server.mailer.sent().len(), 1);
}

#[tokio::test]
async fn test_confirm_survives_mail_failure() {
    let server = TestServer::new().await;
    let invited = server.invited("ABC123", Attendance::Invited).await;
    server.mailer.fail.store(true, Ordering::SeqCst);

    let response = server.send(form_request("/rsvp/ABC123/yes", &[])).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let membership = server.membership(invited.membership.id).await;
    assert_eq!(membership.attendance, Attendance::Confirmed);
    assert!(server.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_guest_without_disclaimer_is_rejected() {
    let server = TestServer::new().await;
    let invited = server.invited("ABC123", Attendance::Invited).await;

    let response = server
        .send(form_request(
            "/rsvp/ABC123/yes",
            &[("has_guest", "1"), ("special_info", "Nut allergy")],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = parse_body(response).await;
    assert_eq!(body["view"], "rsvp/yes");
    assert!(body["data"]["errors"]["guest_disclaimer"].is_array());
    assert_eq!(body["data"]["form"]["special_info"], "Nut allergy");

    let membership = server.membership(invited.membership.id).await;
    assert_eq!(membership.attendance, Attendance::Invited);
    assert!(server.invitation_exists("ABC123").await);
    assert!(server.mailer.sent().is_empty());
    assert!(server.legacy.updates().is_empty());
}

#[tokio::test]
async fn test_dates_outside_event_are_rejected() {
    let server = TestServer::new().await;
    let invited = server.invited("ABC123", Attendance::Invited).await;
    let too_early = (invited.event.start_date - chrono::Duration::days(2)).to_string();

    let response = server
        .send(form_request(
            "/rsvp/ABC123/yes",
            &[("arrival_date", too_early.as_str())],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = parse_body(response).await;
    assert_eq!(
        body["data"]["errors"]["arrival_date"][0],
        "must be within the event dates"
    );
}

#[tokio::test]
async fn test_email_taken_by_someone_else() {
    let server = TestServer::new().await;
    let invited = server.invited("ABC123", Attendance::Invited).await;
    server
        .create_person("Hermann", "Weyl", "weyl@example.com")
        .await;

    let response = server
        .send(form_request(
            "/rsvp/ABC123/yes",
            &[("email", "Weyl@example.com")],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = parse_body(response).await;
    assert_eq!(
        body["data"]["errors"]["email"][0],
        "is already in use by another person"
    );

    let person = db::people::get_person(server.pool(), invited.person.id)
        .await
        .unwrap();
    assert_eq!(person.email, "emmy@example.com");
}

// ---------------------------------------------------------------------------
// Feedback and membership listing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_feedback_after_reply() {
    let server = TestServer::new().await;
    let invited = server.invited("ABC123", Attendance::Invited).await;
    let response = server.send(form_request("/rsvp/ABC123/yes", &[])).await;
    let feedback_uri = location(&response);

    let response = server.send(get(&feedback_uri)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_body(response).await;
    assert_eq!(body["view"], "rsvp/feedback");
    assert_eq!(body["data"]["event"]["code"], "26w5001");
    assert_eq!(body["data"]["attendance"], "Confirmed");

    let response = server
        .send(form_request(
            &feedback_uri,
            &[("feedback_message", "The form was easy to use")],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/events/26w5001/memberships");

    let feedback = db::feedback::list_for_membership(server.pool(), invited.membership.id)
        .await
        .unwrap();
    assert_eq!(feedback.len(), 1);
    assert_eq!(feedback[0].message, "The form was easy to use");
}

#[tokio::test]
async fn test_blank_feedback_is_not_stored() {
    let server = TestServer::new().await;
    let invited = server.invited("ABC123", Attendance::Invited).await;
    let uri = format!("/rsvp/feedback/{}", invited.membership.id);

    let response = server
        .send(form_request(&uri, &[("feedback_message", "   ")]))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let feedback = db::feedback::list_for_membership(server.pool(), invited.membership.id)
        .await
        .unwrap();
    assert!(feedback.is_empty());
}

#[tokio::test]
async fn test_feedback_for_unknown_membership() {
    let server = TestServer::new().await;
    let response = server.send(get("/rsvp/feedback/999")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_memberships_grouped_by_attendance() {
    let server = TestServer::new().await;
    let invited = server.invited("ABC123", Attendance::Invited).await;
    let weyl = server
        .create_person("Hermann", "Weyl", "weyl@example.com")
        .await;
    server
        .add_member(invited.event.id, weyl.id, Attendance::Confirmed)
        .await;

    let response = server.send(get("/events/26w5001/memberships")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_body(response).await;
    assert_eq!(body["view"], "memberships/index");

    let groups = body["data"]["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["attendance"], "Confirmed");
    assert_eq!(groups[0]["members"][0]["name"], "Hermann Weyl");
    assert_eq!(groups[1]["attendance"], "Invited");
    assert_eq!(groups[1]["count"], 1);

    let response = server.send(get("/events/nope/memberships")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Throttling
// ---------------------------------------------------------------------------

fn guess_from(peer: &str, n: usize, forwarded_for: &str) -> http::Request<axum::body::Body> {
    let mut req = http::Request::builder()
        .uri(format!("/rsvp/GUESS{n}"))
        .header("X-Forwarded-For", forwarded_for)
        .body(axum::body::Body::empty())
        .unwrap();
    let addr: SocketAddr = peer.parse().unwrap();
    req.extensions_mut().insert(ConnectInfo(addr));
    req
}

/// Guess codes until the limiter answers 429 and return that response.
async fn guess_until_throttled(
    router: &axum::Router,
    request: impl Fn(usize) -> http::Request<axum::body::Body>,
) -> axum::response::Response {
    for n in 0..60 {
        let response = router.clone().oneshot(request(n)).await.unwrap();
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return response;
        }
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
    panic!("guessing was never throttled");
}

#[tokio::test]
async fn test_code_guessing_is_throttled() {
    let server = TestServer::new().await;
    let router = server.router();

    // A fresh X-Forwarded-For on every request does not reset the bucket.
    let response = guess_until_throttled(&router, |n| {
        guess_from("198.51.100.4:40000", n, &format!("203.0.113.{n}"))
    })
    .await;
    assert!(response.headers().contains_key("retry-after"));

    // Other clients and other routes are unaffected.
    let response = router
        .clone()
        .oneshot(guess_from("198.51.100.5:40000", 0, "203.0.113.9"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = server.send(get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_throttling_behind_trusted_proxy_uses_forwarded_client() {
    let mut server = TestServer::new().await;
    server.state.trust_proxy_headers = true;
    let router = server.router();

    guess_until_throttled(&router, |n| guess_from("10.0.0.1:443", n, "203.0.113.9")).await;

    // Same proxy, different original client.
    let response = router
        .clone()
        .oneshot(guess_from("10.0.0.1:443", 0, "203.0.113.10"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reply_after_code_vanished_is_already_processed() {
    let server = TestServer::new().await;
    let invited = server.invited("ABC123", Attendance::Invited).await;

    let valid = OtpValidator::from_state(&server.state)
        .validate("ABC123", common::today())
        .await
        .unwrap();

    // A concurrent reply consumes the code between validation and the write.
    let mut conn = server.pool().acquire().await.unwrap();
    assert!(db::invitations::delete_by_code(&mut conn, "ABC123")
        .await
        .unwrap());
    drop(conn);

    let outcome = RsvpWorkflow::from_state(&server.state)
        .respond(valid, RsvpAction::No, Reply::default())
        .await
        .unwrap();
    assert!(!outcome.invitation_destroyed);
    assert_eq!(outcome.attendance, Attendance::Declined);
    assert!(outcome.organizer_notified);
    assert_eq!(
        server.membership(invited.membership.id).await.attendance,
        Attendance::Declined
    );
}
