use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db;
use crate::error::{is_valid_email, AppError, Checked, FormErrors};
use crate::models::event::Event;
use crate::models::membership::{Attendance, Membership};
use crate::models::person::Person;

/// Organizer's request to invite one participant to one event.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InvitationForm {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct Invitee {
    pub event: Event,
    pub person: Person,
    pub membership: Membership,
}

impl InvitationForm {
    /// Resolve the form to an invitable membership, collecting every
    /// problem per field. Nothing is written.
    pub async fn check(
        &self,
        pool: &SqlitePool,
        today: NaiveDate,
    ) -> Result<Checked<Invitee>, AppError> {
        let mut errors = FormErrors::new();

        let event_code = self.event.trim();
        let event = if event_code.is_empty() {
            errors.add("event", "can't be blank");
            None
        } else {
            match db::events::find_by_code(pool, event_code).await? {
                Some(event) if event.is_future(today) => Some(event),
                Some(_) => {
                    errors.add("event", "has already started or ended");
                    None
                }
                None => {
                    errors.add("event", "is not a valid event code");
                    None
                }
            }
        };

        let email = self.email.trim();
        let person = if email.is_empty() {
            errors.add("email", "can't be blank");
            None
        } else if !is_valid_email(email) {
            errors.add("email", "is not a valid email address");
            None
        } else {
            let person = db::people::find_by_email(pool, email).await?;
            if person.is_none() {
                errors.add("email", "does not match anyone in our records");
            }
            person
        };

        let (Some(event), Some(person)) = (event, person) else {
            return Ok(Checked::Invalid(errors));
        };

        let Some(membership) = db::memberships::find_for(pool, event.id, person.id).await? else {
            errors.add("email", format!("is not a member of {}", event.code));
            return Ok(Checked::Invalid(errors));
        };

        if membership.attendance != Attendance::Invited {
            errors.add(
                "email",
                format!(
                    "belongs to a member whose attendance is \"{}\", not \"Invited\"",
                    membership.attendance
                ),
            );
            return Ok(Checked::Invalid(errors));
        }

        Ok(Checked::Valid(Invitee {
            event,
            person,
            membership,
        }))
    }
}
