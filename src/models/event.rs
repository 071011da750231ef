use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub location: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub organizer_id: i64,
}

impl Event {
    pub fn is_past(&self, today: NaiveDate) -> bool {
        self.end_date < today
    }

    pub fn is_future(&self, today: NaiveDate) -> bool {
        self.start_date > today
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Long form of the event dates, e.g.
    /// "Sunday, November 1 - Friday, November 6, 2026".
    pub fn dates_long(&self) -> String {
        let start = if self.start_date.year() == self.end_date.year() {
            self.start_date.format("%A, %B %-d").to_string()
        } else {
            self.start_date.format("%A, %B %-d, %Y").to_string()
        };
        format!("{start} - {}", self.end_date.format("%A, %B %-d, %Y"))
    }
}

#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub code: String,
    pub name: String,
    pub location: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub organizer_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(start: (i32, u32, u32), end: (i32, u32, u32)) -> Event {
        Event {
            id: 1,
            code: "26w5001".to_string(),
            name: "Knots and Braids".to_string(),
            location: None,
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            organizer_id: 1,
        }
    }

    #[test]
    fn test_dates_long_same_year() {
        let e = event((2026, 11, 1), (2026, 11, 6));
        assert_eq!(e.dates_long(), "Sunday, November 1 - Friday, November 6, 2026");
    }

    #[test]
    fn test_dates_long_spanning_years() {
        let e = event((2026, 12, 29), (2027, 1, 2));
        assert_eq!(
            e.dates_long(),
            "Tuesday, December 29, 2026 - Saturday, January 2, 2027"
        );
    }

    #[test]
    fn test_past_and_future() {
        let e = event((2026, 11, 1), (2026, 11, 6));
        let day = |d| NaiveDate::from_ymd_opt(2026, 11, d).unwrap();
        assert!(e.is_future(day(1).pred_opt().unwrap()));
        assert!(!e.is_future(day(1)));
        assert!(!e.is_past(day(6)));
        assert!(e.is_past(day(7)));
        assert!(e.covers(day(3)));
        assert!(!e.covers(day(7)));
    }
}
