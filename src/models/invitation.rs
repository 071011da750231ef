use chrono::{Duration, NaiveDate};
use serde::Serialize;

pub const CODE_LENGTH: usize = 50;

#[derive(Debug, Clone, Serialize)]
pub struct Invitation {
    pub id: i64,
    pub code: String,
    pub membership_id: i64,
    pub expires: NaiveDate,
    pub invited_by: Option<String>,
    pub created_at: String,
}

impl Invitation {
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expires < today
    }

    /// Expiry date as shown to invitees, e.g. "October 4, 2026".
    pub fn expire_date(&self) -> String {
        self.expires.format("%B %-d, %Y").to_string()
    }
}

/// How long an invitation stays valid, relative to the event it is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    pub days_before_event: i64,
    pub min_window_days: i64,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            days_before_event: 28,
            min_window_days: 7,
        }
    }
}

impl ExpiryPolicy {
    /// `days_before_event` ahead of the start, but never sooner than
    /// `min_window_days` from today and never after the event starts.
    pub fn expires_for(&self, event_start: NaiveDate, today: NaiveDate) -> NaiveDate {
        let preferred = event_start - Duration::days(self.days_before_event);
        let floor = today + Duration::days(self.min_window_days);
        preferred.max(floor).min(event_start)
    }
}

/// Generate a random alphanumeric invitation code.
pub fn generate_code() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}
