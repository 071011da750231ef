use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::db;
use crate::error::{AppError, Checked, FormErrors};
use crate::invitations::form::InvitationForm;
use crate::mailer::Mailer;
use crate::models::event::Event;
use crate::models::invitation::{generate_code, ExpiryPolicy, Invitation};
use crate::models::person::Person;
use crate::notifications;
use crate::state::AppState;

const MAX_CODE_ATTEMPTS: usize = 5;

#[derive(Debug, Clone)]
pub struct IssuedInvitation {
    pub invitation: Invitation,
    pub event: Event,
    pub person: Person,
}

pub struct InvitationIssuer<'a> {
    pool: &'a SqlitePool,
    mailer: &'a dyn Mailer,
    public_url: &'a str,
    mail_from: &'a str,
    expiry: ExpiryPolicy,
}

impl<'a> InvitationIssuer<'a> {
    pub fn new(
        pool: &'a SqlitePool,
        mailer: &'a dyn Mailer,
        public_url: &'a str,
        mail_from: &'a str,
        expiry: ExpiryPolicy,
    ) -> Self {
        Self {
            pool,
            mailer,
            public_url,
            mail_from,
            expiry,
        }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(
            &state.db,
            state.mailer.as_ref(),
            &state.public_url,
            &state.mail_from,
            state.expiry,
        )
    }

    async fn unused_code(&self) -> Result<String, AppError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_code();
            if db::invitations::find_by_code(self.pool, &code).await?.is_none() {
                return Ok(code);
            }
        }
        Err(AppError::Internal(
            "could not generate an unused invitation code".to_string(),
        ))
    }

    /// Validate the form, then store and send a fresh invitation. Earlier
    /// codes for the same membership stop working only once the email has
    /// been handed off. No transaction is held open while mail is delivered.
    pub async fn issue(
        &self,
        form: &InvitationForm,
        invited_by: &str,
        today: NaiveDate,
    ) -> Result<Checked<IssuedInvitation>, AppError> {
        let invitee = match form.check(self.pool, today).await? {
            Checked::Valid(invitee) => invitee,
            Checked::Invalid(errors) => return Ok(Checked::Invalid(errors)),
        };

        let organizer = db::people::get_person(self.pool, invitee.event.organizer_id).await?;
        let code = self.unused_code().await?;
        let expires = self.expiry.expires_for(invitee.event.start_date, today);

        let mut conn = self.pool.acquire().await?;
        let invitation = db::invitations::create_invitation(
            &mut conn,
            &code,
            invitee.membership.id,
            expires,
            Some(invited_by),
        )
        .await?;
        drop(conn);

        let email = notifications::invitation_email(
            self.mail_from,
            self.public_url,
            &invitee.event,
            &organizer,
            &invitee.person,
            &invitation,
        );
        if let Err(e) = self.mailer.deliver(&email).await {
            tracing::warn!(
                membership_id = invitee.membership.id,
                "invitation email not delivered, discarding invitation: {e}"
            );
            let mut conn = self.pool.acquire().await?;
            db::invitations::delete_by_code(&mut conn, &invitation.code).await?;
            let mut errors = FormErrors::new();
            errors.add("base", format!("The invitation could not be sent: {e}"));
            return Ok(Checked::Invalid(errors));
        }

        let mut conn = self.pool.acquire().await?;
        let replaced = db::invitations::delete_others_for_membership(
            &mut conn,
            invitee.membership.id,
            invitation.id,
        )
        .await?;
        drop(conn);

        tracing::info!(
            membership_id = invitee.membership.id,
            event = %invitee.event.code,
            %expires,
            replaced,
            invited_by,
            "sent invitation"
        );

        Ok(Checked::Valid(IssuedInvitation {
            invitation,
            event: invitee.event,
            person: invitee.person,
        }))
    }
}
