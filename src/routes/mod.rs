mod health;
mod invitations;
mod memberships;
mod rsvp;

use axum::middleware as axum_mw;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::middleware::rate_limit::rate_limit_middleware;
use crate::state::AppState;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/version", get(health::version))
        .merge(rsvp_routes(&state))
        .route(
            "/events/{event_code}/memberships",
            get(memberships::list_memberships),
        )
        .route(
            "/invitations",
            get(invitations::index).post(invitations::create),
        )
        .route("/invitations/new", get(invitations::new))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Invitee-facing routes. Every request here carries a code guess or a
/// membership id, so the whole group is throttled.
fn rsvp_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/rsvp", get(rsvp::missing_code))
        .route("/rsvp/", get(rsvp::missing_code))
        .route("/rsvp/{code}", get(rsvp::index))
        .route("/rsvp/{code}/yes", get(rsvp::yes_form).post(rsvp::yes))
        .route("/rsvp/{code}/no", get(rsvp::no_form).post(rsvp::no))
        .route("/rsvp/{code}/maybe", get(rsvp::maybe_form).post(rsvp::maybe))
        .route(
            "/rsvp/feedback/{membership_id}",
            get(rsvp::feedback_form).post(rsvp::feedback),
        )
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
}

pub(crate) fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}
