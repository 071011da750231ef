use sqlx::SqlitePool;

use crate::db;
use crate::error::AppError;
use crate::legacy::{LegacyConnector, LegacyMember};
use crate::mailer::Mailer;
use crate::models::membership::{Attendance, RsvpDetails};
use crate::models::person::UpdatePerson;
use crate::notifications;
use crate::rsvp::validator::ValidInvitation;
use crate::state::AppState;

const UPDATED_BY: &str = "RSVP";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsvpAction {
    Yes,
    No,
    Maybe,
}

impl RsvpAction {
    pub fn attendance(self) -> Attendance {
        match self {
            RsvpAction::Yes => Attendance::Confirmed,
            RsvpAction::No => Attendance::Declined,
            RsvpAction::Maybe => Attendance::Undecided,
        }
    }

    /// Tentative replies keep the code so the invitee can come back.
    pub fn consumes_invitation(self) -> bool {
        !matches!(self, RsvpAction::Maybe)
    }
}

/// What the invitee submitted along with their answer.
#[derive(Debug, Clone, Default)]
pub struct Reply {
    pub message: Option<String>,
    pub person: Option<UpdatePerson>,
    pub details: Option<RsvpDetails>,
}

impl Reply {
    pub fn with_message(message: Option<String>) -> Self {
        Self {
            message: message
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub membership_id: i64,
    pub attendance: Attendance,
    pub invitation_destroyed: bool,
    pub organizer_notified: bool,
    pub legacy_synced: bool,
}

pub struct RsvpWorkflow<'a> {
    pool: &'a SqlitePool,
    legacy: &'a dyn LegacyConnector,
    mailer: &'a dyn Mailer,
    mail_from: &'a str,
}

impl<'a> RsvpWorkflow<'a> {
    pub fn new(
        pool: &'a SqlitePool,
        legacy: &'a dyn LegacyConnector,
        mailer: &'a dyn Mailer,
        mail_from: &'a str,
    ) -> Self {
        Self {
            pool,
            legacy,
            mailer,
            mail_from,
        }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(
            &state.db,
            state.legacy.as_ref(),
            state.mailer.as_ref(),
            &state.mail_from,
        )
    }

    /// Apply the invitee's answer. Local state is written first and is
    /// authoritative; the organizer notice and the legacy mirror are
    /// best-effort and only logged when they fail.
    pub async fn respond(
        &self,
        valid: ValidInvitation,
        action: RsvpAction,
        reply: Reply,
    ) -> Result<Outcome, AppError> {
        let attendance = action.attendance();
        let membership_id = valid.membership.id;

        let mut tx = self.pool.begin().await?;
        let person = match reply.person {
            Some(ref update) => {
                db::people::update_person(&mut tx, valid.person.id, update).await?
            }
            None => valid.person.clone(),
        };
        if let Some(ref details) = reply.details {
            db::memberships::apply_rsvp_details(&mut tx, membership_id, details).await?;
        }
        let membership =
            db::memberships::record_reply(&mut tx, membership_id, attendance, UPDATED_BY).await?;

        let mut invitation_destroyed = false;
        if action.consumes_invitation() {
            invitation_destroyed =
                db::invitations::delete_by_code(&mut tx, &valid.invitation.code).await?;
            if !invitation_destroyed {
                tracing::debug!(membership_id, "invitation already removed, already processed");
            }
        }
        tx.commit().await?;

        tracing::info!(
            membership_id,
            event = %valid.event.code,
            %attendance,
            "recorded RSVP"
        );

        let notice = notifications::organizer_notice(
            self.mail_from,
            &valid.event,
            &valid.organizer,
            &person,
            attendance,
            reply.message.as_deref(),
        );
        let organizer_notified = match self.mailer.deliver(&notice).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(membership_id, "failed to notify organizer: {e}");
                false
            }
        };

        let member = LegacyMember::new(&valid.event, &person, &membership);
        let legacy_synced = match self.legacy.update_member(&member).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(membership_id, "legacy member update failed: {e}");
                false
            }
        };

        Ok(Outcome {
            membership_id,
            attendance,
            invitation_destroyed,
            organizer_notified,
            legacy_synced,
        })
    }
}
