//! Invitee-facing RSVP flow. The one-time code is the only credential;
//! nothing here depends on organizer authentication.

pub mod feedback;
pub mod form;
pub mod validator;
pub mod workflow;

pub use validator::{Lookup, OtpValidator, ValidInvitation};
pub use workflow::{Outcome, Reply, RsvpAction, RsvpWorkflow};

pub fn feedback_path(membership_id: i64) -> String {
    format!("/rsvp/feedback/{membership_id}")
}
