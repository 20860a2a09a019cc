use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::timeslot::parse_hhmm;

pub const DEFAULT_OPENING_TIME: &str = "09:00";
pub const DEFAULT_CLOSING_TIME: &str = "19:00";
pub const DEFAULT_TIME_STEP: i64 = 15;
pub const DEFAULT_RESOURCES: i64 = 3;
pub const DEFAULT_BUFFER_TIME: i64 = 10;

/// Fully resolved salon configuration. Times are local wall-clock,
/// one timezone per deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalonConfig {
    pub opening_time: String,
    pub closing_time: String,
    /// Slot grid step in minutes.
    pub time_step: i64,
    /// Number of bookings allowed to overlap the same instant.
    pub resources: i64,
    /// Minutes appended after every booking's end when checking conflicts.
    pub buffer_time: i64,
    /// Weekdays the salon is closed, 0 = Sunday.
    pub closed_days_of_week: Vec<u8>,
    /// Exact closed dates, `YYYY-MM-DD`.
    pub closed_dates: Vec<String>,
}

impl Default for SalonConfig {
    fn default() -> Self {
        Self {
            opening_time: DEFAULT_OPENING_TIME.to_string(),
            closing_time: DEFAULT_CLOSING_TIME.to_string(),
            time_step: DEFAULT_TIME_STEP,
            resources: DEFAULT_RESOURCES,
            buffer_time: DEFAULT_BUFFER_TIME,
            closed_days_of_week: vec![],
            closed_dates: vec![],
        }
    }
}

/// Partial configuration as persisted in the settings store. Any subset
/// of fields may be present; missing or unusable values fall back to the
/// defaults field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredSalonConfig {
    pub opening_time: Option<String>,
    pub closing_time: Option<String>,
    pub time_step: Option<i64>,
    pub resources: Option<i64>,
    pub buffer_time: Option<i64>,
    pub closed_days_of_week: Option<Vec<u8>>,
    pub closed_dates: Option<Vec<String>>,
}

impl SalonConfig {
    /// Merge a stored partial configuration with the defaults. Never
    /// fails: unparseable times, a zero step or zero resources are
    /// treated as absent.
    pub fn resolve(stored: Option<&StoredSalonConfig>) -> Self {
        let defaults = Self::default();
        let Some(stored) = stored else {
            return defaults;
        };

        Self {
            opening_time: stored
                .opening_time
                .clone()
                .filter(|t| parse_hhmm(t).is_some())
                .unwrap_or(defaults.opening_time),
            closing_time: stored
                .closing_time
                .clone()
                .filter(|t| parse_hhmm(t).is_some())
                .unwrap_or(defaults.closing_time),
            time_step: stored
                .time_step
                .filter(|s| *s > 0)
                .unwrap_or(defaults.time_step),
            resources: stored
                .resources
                .filter(|r| *r >= 1)
                .unwrap_or(defaults.resources),
            buffer_time: stored
                .buffer_time
                .filter(|b| *b >= 0)
                .unwrap_or(defaults.buffer_time),
            closed_days_of_week: stored
                .closed_days_of_week
                .clone()
                .unwrap_or(defaults.closed_days_of_week),
            closed_dates: stored.closed_dates.clone().unwrap_or(defaults.closed_dates),
        }
    }

    pub fn opening_minutes(&self) -> i64 {
        parse_hhmm(&self.opening_time).unwrap_or(9 * 60)
    }

    pub fn closing_minutes(&self) -> i64 {
        parse_hhmm(&self.closing_time).unwrap_or(19 * 60)
    }

    /// Whether the salon is closed on the given day, either because the
    /// exact date is closed or its weekday (0 = Sunday) is.
    pub fn is_closed_on(&self, day: NaiveDate, date: &str) -> bool {
        if self.closed_dates.iter().any(|d| d == date) {
            return true;
        }
        let weekday = day.weekday().num_days_from_sunday() as u8;
        self.closed_days_of_week.contains(&weekday)
    }
}
