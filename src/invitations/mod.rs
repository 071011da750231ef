//! Organizer-facing invitation issuing. Callers are responsible for
//! checking that the organizer is allowed to invite.

pub mod form;
pub mod issuer;

pub use form::{InvitationForm, Invitee};
pub use issuer::{InvitationIssuer, IssuedInvitation};
