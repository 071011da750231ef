use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db;
use crate::error::{is_valid_email, AppError, Checked, FormErrors};
use crate::models::event::Event;
use crate::models::membership::{Membership, RsvpDetails};
use crate::models::person::{Person, UpdatePerson};

pub const ARRIVAL_DEPARTURE_INTRO: &str = "If you plan to arrive after the event starts or \
    leave before it ends, please let us know your dates so we can plan accommodation.";
pub const GUESTS_INTRO: &str = "You may bring a guest. Guests are welcome at meals and social \
    activities, but their costs are not covered by the event.";
pub const SPECIAL_INTRO: &str = "Please tell us about any dietary restrictions or other \
    special needs we should know about.";
pub const PRIVACY_NOTICE: &str = "Your profile information is shared with the event's \
    organizers and other participants. It is not shared with third parties.";

/// Message to the organizer, submitted with a No or Maybe reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageForm {
    pub organizer_message: Option<String>,
}

/// Confirmation form: profile fields, RSVP details, and a message.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct YesForm {
    pub organizer_message: Option<String>,
    pub arrival_date: Option<String>,
    pub departure_date: Option<String>,
    pub has_guest: Option<String>,
    pub guest_disclaimer: Option<String>,
    pub special_info: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub affiliation: Option<String>,
    pub department: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub phone: Option<String>,
    pub address1: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub biography: Option<String>,
    pub research_areas: Option<String>,
}

/// A confirmation that passed validation.
#[derive(Debug, Clone)]
pub struct Confirmation {
    pub person: UpdatePerson,
    pub details: RsvpDetails,
    pub message: Option<String>,
}

fn checkbox(value: &Option<String>) -> bool {
    matches!(
        value.as_deref().map(str::trim),
        Some("1") | Some("on") | Some("true") | Some("yes")
    )
}

fn blank_to_none(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_date(
    field: &str,
    value: &Option<String>,
    errors: &mut FormErrors,
) -> Option<NaiveDate> {
    let value = blank_to_none(value)?;
    match NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, "is not a valid date");
            None
        }
    }
}

impl YesForm {
    /// Pre-fill the form from what we already know about the invitee.
    pub fn prefilled(person: &Person, membership: &Membership) -> Self {
        Self {
            organizer_message: None,
            arrival_date: membership.arrival_date.map(|d| d.to_string()),
            departure_date: membership.departure_date.map(|d| d.to_string()),
            has_guest: membership.has_guest.then(|| "1".to_string()),
            guest_disclaimer: membership.guest_disclaimer.then(|| "1".to_string()),
            special_info: membership.special_info.clone(),
            firstname: Some(person.firstname.clone()),
            lastname: Some(person.lastname.clone()),
            email: Some(person.email.clone()),
            affiliation: person.affiliation.clone(),
            department: person.department.clone(),
            title: person.title.clone(),
            url: person.url.clone(),
            phone: person.phone.clone(),
            address1: person.address1.clone(),
            city: person.city.clone(),
            region: person.region.clone(),
            country: person.country.clone(),
            postal_code: person.postal_code.clone(),
            biography: person.biography.clone(),
            research_areas: person.research_areas.clone(),
        }
    }

    /// Field checks that need no database access.
    pub fn validate(&self, event: &Event) -> Result<Confirmation, FormErrors> {
        let mut errors = FormErrors::new();

        let arrival_date = parse_date("arrival_date", &self.arrival_date, &mut errors);
        let departure_date = parse_date("departure_date", &self.departure_date, &mut errors);

        if let Some(arrival) = arrival_date {
            if !event.covers(arrival) {
                errors.add("arrival_date", "must be within the event dates");
            }
        }
        if let Some(departure) = departure_date {
            if !event.covers(departure) {
                errors.add("departure_date", "must be within the event dates");
            }
        }
        if let (Some(arrival), Some(departure)) = (arrival_date, departure_date) {
            if arrival > departure {
                errors.add("departure_date", "must not be before the arrival date");
            }
        }

        let has_guest = checkbox(&self.has_guest);
        let guest_disclaimer = checkbox(&self.guest_disclaimer);
        if has_guest && !guest_disclaimer {
            errors.add(
                "guest_disclaimer",
                "must be accepted if you are bringing a guest",
            );
        }

        for (field, value) in [("firstname", &self.firstname), ("lastname", &self.lastname)] {
            if matches!(value.as_deref().map(str::trim), Some("")) {
                errors.add(field, "can't be blank");
            }
        }

        if let Some(email) = self.email.as_deref() {
            if email.trim().is_empty() {
                errors.add("email", "can't be blank");
            } else if !is_valid_email(email) {
                errors.add("email", "is not a valid email address");
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Confirmation {
            person: UpdatePerson {
                firstname: self.firstname.clone(),
                lastname: self.lastname.clone(),
                email: self.email.as_deref().map(|e| e.trim().to_string()),
                affiliation: self.affiliation.clone(),
                department: self.department.clone(),
                title: self.title.clone(),
                url: self.url.clone(),
                phone: self.phone.clone(),
                address1: self.address1.clone(),
                city: self.city.clone(),
                region: self.region.clone(),
                country: self.country.clone(),
                postal_code: self.postal_code.clone(),
                biography: self.biography.clone(),
                research_areas: self.research_areas.clone(),
            },
            details: RsvpDetails {
                arrival_date,
                departure_date,
                has_guest,
                guest_disclaimer,
                special_info: blank_to_none(&self.special_info),
            },
            message: blank_to_none(&self.organizer_message),
        })
    }

    /// Full validation, including that a changed email is not taken.
    pub async fn check(
        &self,
        pool: &SqlitePool,
        event: &Event,
        person: &Person,
    ) -> Result<Checked<Confirmation>, AppError> {
        let confirmation = match self.validate(event) {
            Ok(confirmation) => confirmation,
            Err(errors) => return Ok(Checked::Invalid(errors)),
        };

        if let Some(ref email) = confirmation.person.email {
            if !email.eq_ignore_ascii_case(&person.email) {
                if let Some(other) = db::people::find_by_email(pool, email).await? {
                    if other.id != person.id {
                        let mut errors = FormErrors::new();
                        errors.add("email", "is already in use by another person");
                        return Ok(Checked::Invalid(errors));
                    }
                }
            }
        }

        Ok(Checked::Valid(confirmation))
    }
}
