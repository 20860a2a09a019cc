use serde::{Deserialize, Serialize};

/// A candidate appointment slot, as proposed by the salon when the
/// originally requested time cannot be honored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeSlot {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

/// Parse a `HH:mm` wall-clock string into minutes since midnight.
pub fn parse_hhmm(s: &str) -> Option<i64> {
    let (h, m) = s.split_once(':')?;
    if h.len() != 2 || m.len() != 2 {
        return None;
    }
    let hour: i64 = h.parse().ok()?;
    let minute: i64 = m.parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(hour * 60 + minute)
}

pub fn format_hhmm(minutes: i64) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Strict `YYYY-MM-DD` check. chrono accepts unpadded fields, so the
/// length check keeps the stored wire format uniform.
pub fn is_valid_date(s: &str) -> bool {
    s.len() == 10 && chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}
