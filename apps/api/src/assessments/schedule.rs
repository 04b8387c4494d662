//! Test windows. A window is stored as separate date and time columns and is
//! interpreted as UTC.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::models::AttemptStatus;

/// How long after the window closes a manual submission is still accepted.
pub const SUBMISSION_GRACE_SECS: i64 = 2 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Where a test sits on a candidate's dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Upcoming,
    Ongoing,
    Completed,
}

impl TestWindow {
    pub fn new(
        start_date: NaiveDate,
        start_time: NaiveTime,
        end_date: NaiveDate,
        end_time: NaiveTime,
    ) -> Self {
        Self {
            start: start_date.and_time(start_time).and_utc(),
            end: end_date.and_time(end_time).and_utc(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.end > self.start
    }

    pub fn not_started(&self, now: DateTime<Utc>) -> bool {
        now < self.start
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now > self.end
    }

    /// Both bounds are inclusive.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        !self.not_started(now) && !self.has_ended(now)
    }

    /// Automatic submissions (timer expiry on the client) are always taken.
    pub fn accepts_submission(&self, now: DateTime<Utc>, auto_submitted: bool) -> bool {
        auto_submitted || now <= self.end + Duration::seconds(SUBMISSION_GRACE_SECS)
    }

    /// The latest moment an attempt started at `started_at` may run until.
    pub fn deadline_for(&self, started_at: DateTime<Utc>, duration_minutes: i32) -> DateTime<Utc> {
        let by_duration = started_at + Duration::minutes(i64::from(duration_minutes));
        by_duration.min(self.end)
    }
}

/// Returns the category and whether the test expired without a submission.
pub fn categorize(
    window: &TestWindow,
    attempt: Option<AttemptStatus>,
    now: DateTime<Utc>,
) -> (Category, bool) {
    if attempt.is_some_and(AttemptStatus::is_finished) {
        return (Category::Completed, false);
    }
    if window.not_started(now) {
        (Category::Upcoming, false)
    } else if window.is_open(now) {
        (Category::Ongoing, false)
    } else {
        (Category::Completed, true)
    }
}

/// Accepts `HH:MM` (as sent by time inputs) and `HH:MM:SS`.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window() -> TestWindow {
        TestWindow::new(
            parse_date("2025-03-10").unwrap(),
            parse_time("09:00").unwrap(),
            parse_date("2025-03-10").unwrap(),
            parse_time("11:30:00").unwrap(),
        )
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, h, m, s).unwrap()
    }

    #[test]
    fn test_categories_by_time() {
        let w = window();
        assert_eq!(categorize(&w, None, at(8, 59, 59)), (Category::Upcoming, false));
        assert_eq!(categorize(&w, None, at(10, 0, 0)), (Category::Ongoing, false));
        assert_eq!(categorize(&w, None, at(11, 30, 1)), (Category::Completed, true));
    }

    #[test]
    fn test_window_bounds_inclusive() {
        let w = window();
        assert_eq!(categorize(&w, None, at(9, 0, 0)).0, Category::Ongoing);
        assert_eq!(categorize(&w, None, at(11, 30, 0)).0, Category::Ongoing);
    }

    #[test]
    fn test_submitted_is_completed_regardless_of_time() {
        let w = window();
        for status in [AttemptStatus::Submitted, AttemptStatus::Evaluated] {
            assert_eq!(categorize(&w, Some(status), at(8, 0, 0)), (Category::Completed, false));
        }
        assert_eq!(
            categorize(&w, Some(AttemptStatus::InProgress), at(10, 0, 0)).0,
            Category::Ongoing
        );
    }

    #[test]
    fn test_submission_grace() {
        let w = window();
        assert!(w.accepts_submission(at(11, 32, 0), false));
        assert!(!w.accepts_submission(at(11, 32, 1), false));
        assert!(w.accepts_submission(at(15, 0, 0), true));
    }

    #[test]
    fn test_deadline_capped_by_window() {
        let w = window();
        assert_eq!(w.deadline_for(at(9, 0, 0), 60), at(10, 0, 0));
        assert_eq!(w.deadline_for(at(11, 0, 0), 60), at(11, 30, 0));
    }

    #[test]
    fn test_window_validity() {
        assert!(window().is_valid());
        let w = window();
        assert!(!TestWindow { start: w.end, end: w.start }.is_valid());
    }

    #[test]
    fn test_parse_time_formats() {
        assert_eq!(parse_time("7:05"), NaiveTime::from_hms_opt(7, 5, 0));
        assert_eq!(parse_time("23:59:59"), NaiveTime::from_hms_opt(23, 59, 59));
        assert_eq!(parse_time("noon"), None);
        assert_eq!(parse_date("2025-13-01"), None);
    }
}
