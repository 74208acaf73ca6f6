use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::ToSchema;

/// One continuous presence period. `check_out` is `None` while the user is still in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Interval {
    #[schema(example = "2026-01-01T08:58:12Z", format = "date-time", value_type = String)]
    pub check_in: DateTime<Utc>,
    #[schema(example = "2026-01-01T12:30:00Z", format = "date-time", value_type = Option<String>)]
    pub check_out: Option<DateTime<Utc>>,
}

impl Interval {
    pub fn open(at: DateTime<Utc>) -> Self {
        Self {
            check_in: at,
            check_out: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.check_out.is_none()
    }

    /// Worked milliseconds; open or inverted intervals count as zero.
    pub fn worked_millis(&self) -> i64 {
        match self.check_out {
            Some(out) => (out - self.check_in).num_milliseconds().max(0),
            None => 0,
        }
    }
}

/// Direction of a scan after it was applied to the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, ToSchema)]
pub enum ScanStatus {
    #[strum(serialize = "checked in")]
    #[serde(rename = "checked in")]
    CheckedIn,
    #[strum(serialize = "checked out")]
    #[serde(rename = "checked out")]
    CheckedOut,
}

/// All intervals of one user on one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "uid": "04A1B2C3",
    "name": "John Doe",
    "date": "2026-01-01",
    "entries": [
        { "check_in": "2026-01-01T08:58:12Z", "check_out": "2026-01-01T12:30:00Z" },
        { "check_in": "2026-01-01T13:15:40Z", "check_out": null }
    ]
}))]
pub struct AttendanceDay {
    pub uid: String,
    pub name: String,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub entries: Vec<Interval>,
}

impl AttendanceDay {
    /// First scan of the day: a single open interval.
    pub fn start(uid: &str, name: &str, date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            uid: uid.to_string(),
            name: name.to_string(),
            date,
            entries: vec![Interval::open(now)],
        }
    }

    /// Applies a scan: closes the open interval if there is one, otherwise opens a new one.
    pub fn toggle(&mut self, now: DateTime<Utc>) -> ScanStatus {
        match self.entries.last_mut() {
            Some(last) if last.is_open() => {
                last.check_out = Some(now);
                ScanStatus::CheckedOut
            }
            _ => {
                self.entries.push(Interval::open(now));
                ScanStatus::CheckedIn
            }
        }
    }

    pub fn is_present(&self) -> bool {
        self.entries.last().is_some_and(Interval::is_open)
    }

    pub fn worked_millis(&self) -> i64 {
        self.entries.iter().map(Interval::worked_millis).sum()
    }

    /// Fractional hours over closed intervals.
    pub fn total_hours(&self) -> f64 {
        self.worked_millis() as f64 / 3_600_000.0
    }
}

/// Hours rounded to two decimals for API output.
pub fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}
