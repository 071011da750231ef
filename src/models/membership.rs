use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Attendance state of a participant. Stored as its display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attendance {
    #[serde(rename = "Not Yet Invited")]
    NotYetInvited,
    Invited,
    Confirmed,
    Declined,
    Undecided,
}

impl Attendance {
    pub const ALL: [Attendance; 5] = [
        Attendance::Confirmed,
        Attendance::Invited,
        Attendance::Undecided,
        Attendance::NotYetInvited,
        Attendance::Declined,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Attendance::NotYetInvited => "Not Yet Invited",
            Attendance::Invited => "Invited",
            Attendance::Confirmed => "Confirmed",
            Attendance::Declined => "Declined",
            Attendance::Undecided => "Undecided",
        }
    }
}

impl fmt::Display for Attendance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Attendance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Not Yet Invited" => Ok(Attendance::NotYetInvited),
            "Invited" => Ok(Attendance::Invited),
            "Confirmed" => Ok(Attendance::Confirmed),
            "Declined" => Ok(Attendance::Declined),
            "Undecided" => Ok(Attendance::Undecided),
            other => Err(format!("unknown attendance: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Membership {
    pub id: i64,
    pub event_id: i64,
    pub person_id: i64,
    pub role: String,
    pub attendance: Attendance,
    pub arrival_date: Option<NaiveDate>,
    pub departure_date: Option<NaiveDate>,
    pub has_guest: bool,
    pub guest_disclaimer: bool,
    pub special_info: Option<String>,
    pub replied_at: Option<String>,
    pub updated_by: Option<String>,
}

/// RSVP-specific fields an invitee may set when confirming.
#[derive(Debug, Clone, Default)]
pub struct RsvpDetails {
    pub arrival_date: Option<NaiveDate>,
    pub departure_date: Option<NaiveDate>,
    pub has_guest: bool,
    pub guest_disclaimer: bool,
    pub special_info: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateMembership {
    pub event_id: i64,
    pub person_id: i64,
    pub role: String,
    pub attendance: Attendance,
}
