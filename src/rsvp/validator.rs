//! Turns a one-time code into a usable invitation, or explains why it is not.
//!
//! Codes are looked up locally first. Codes unknown here are offered to
//! the legacy system, and a matching legacy membership gets a local
//! invitation under the same code. Checks then run in a fixed order:
//! past event, expired code, attendance state.

use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::db;
use crate::error::{AppError, InvitationError};
use crate::legacy::{LegacyConnector, LegacyMembership, LegacyRsvp};
use crate::models::event::Event;
use crate::models::invitation::{ExpiryPolicy, Invitation};
use crate::models::membership::{Attendance, Membership};
use crate::models::person::Person;
use crate::state::AppState;

const INVALID_CODE: &str = "Invalid code";

/// Where a code was resolved, if anywhere.
#[derive(Debug)]
pub enum Lookup {
    Found(Invitation),
    NotFoundLocally,
    Denied(String),
}

/// Everything the RSVP pages need once a code checks out.
#[derive(Debug, Clone)]
pub struct ValidInvitation {
    pub invitation: Invitation,
    pub membership: Membership,
    pub person: Person,
    pub event: Event,
    pub organizer: Person,
}

pub struct OtpValidator<'a> {
    pool: &'a SqlitePool,
    legacy: &'a dyn LegacyConnector,
    expiry: ExpiryPolicy,
}

impl<'a> OtpValidator<'a> {
    pub fn new(pool: &'a SqlitePool, legacy: &'a dyn LegacyConnector, expiry: ExpiryPolicy) -> Self {
        Self {
            pool,
            legacy,
            expiry,
        }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(&state.db, state.legacy.as_ref(), state.expiry)
    }

    pub async fn lookup_local(&self, code: &str) -> Result<Lookup, AppError> {
        Ok(match db::invitations::find_by_code(self.pool, code).await? {
            Some(invitation) => Lookup::Found(invitation),
            None => Lookup::NotFoundLocally,
        })
    }

    /// Ask the legacy system about `code`. Transport failures and legacy
    /// memberships that do not exist locally both count as a denial.
    pub async fn lookup_legacy(&self, code: &str, today: NaiveDate) -> Result<Lookup, AppError> {
        let member = match self.legacy.check_rsvp(code).await {
            Ok(LegacyRsvp::Member(member)) => member,
            Ok(LegacyRsvp::Denied(reason)) => return Ok(Lookup::Denied(reason)),
            Err(e) => {
                tracing::warn!("legacy code check failed, treating code as invalid: {e}");
                return Ok(Lookup::Denied(INVALID_CODE.to_string()));
            }
        };

        self.attach_legacy_invitation(code, &member, today).await
    }

    async fn attach_legacy_invitation(
        &self,
        code: &str,
        member: &LegacyMembership,
        today: NaiveDate,
    ) -> Result<Lookup, AppError> {
        let Some(event) = db::events::find_by_code(self.pool, &member.event_code).await? else {
            tracing::warn!(event = %member.event_code, "legacy code refers to an unknown event");
            return Ok(Lookup::Denied(INVALID_CODE.to_string()));
        };
        let Some(person) = db::people::find_by_email(self.pool, &member.email).await? else {
            tracing::warn!(event = %event.code, "legacy code refers to an unknown person");
            return Ok(Lookup::Denied(INVALID_CODE.to_string()));
        };
        let Some(membership) = db::memberships::find_for(self.pool, event.id, person.id).await?
        else {
            tracing::warn!(
                event = %event.code,
                person_id = person.id,
                "legacy code refers to a membership we do not have"
            );
            return Ok(Lookup::Denied(INVALID_CODE.to_string()));
        };

        let expires = member
            .expires
            .unwrap_or_else(|| self.expiry.expires_for(event.start_date, today));

        let mut conn = self.pool.acquire().await?;
        match db::invitations::create_invitation(
            &mut conn,
            code,
            membership.id,
            expires,
            Some("legacy"),
        )
        .await
        {
            Ok(invitation) => {
                tracing::info!(
                    membership_id = membership.id,
                    %expires,
                    "attached legacy invitation code"
                );
                Ok(Lookup::Found(invitation))
            }
            // A concurrent request attached the same code first.
            Err(AppError::Database(sqlx::Error::Database(e))) if e.is_unique_violation() => {
                drop(conn);
                self.lookup_local(code).await
            }
            Err(e) => Err(e),
        }
    }

    /// Local lookup, falling back to the legacy system. Never returns
    /// `NotFoundLocally`.
    pub async fn resolve(&self, code: &str, today: NaiveDate) -> Result<Lookup, AppError> {
        match self.lookup_local(code).await? {
            Lookup::NotFoundLocally => self.lookup_legacy(code, today).await,
            found => Ok(found),
        }
    }

    pub async fn validate(&self, code: &str, today: NaiveDate) -> Result<ValidInvitation, AppError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(InvitationError::InvalidCode(INVALID_CODE.to_string()).into());
        }

        let invitation = match self.resolve(code, today).await? {
            Lookup::Found(invitation) => invitation,
            Lookup::Denied(reason) => return Err(InvitationError::InvalidCode(reason).into()),
            Lookup::NotFoundLocally => {
                return Err(InvitationError::InvalidCode(INVALID_CODE.to_string()).into())
            }
        };

        let membership = db::memberships::get_membership(self.pool, invitation.membership_id).await?;
        let event = db::events::get_event(self.pool, membership.event_id).await?;

        check_usable(&invitation, &membership, &event, today)?;

        let person = db::people::get_person(self.pool, membership.person_id).await?;
        let organizer = db::people::get_person(self.pool, event.organizer_id).await?;

        Ok(ValidInvitation {
            invitation,
            membership,
            person,
            event,
            organizer,
        })
    }
}

/// State checks on a resolved invitation, first failure wins.
pub fn check_usable(
    invitation: &Invitation,
    membership: &Membership,
    event: &Event,
    today: NaiveDate,
) -> Result<(), InvitationError> {
    if event.is_past(today) {
        return Err(InvitationError::PastEvent);
    }
    if invitation.is_expired(today) {
        return Err(InvitationError::Expired);
    }
    match membership.attendance {
        Attendance::NotYetInvited => Err(InvitationError::NotYetInvited),
        Attendance::Declined => Err(InvitationError::AlreadyDeclined),
        Attendance::Invited | Attendance::Confirmed | Attendance::Undecided => Ok(()),
    }
}
