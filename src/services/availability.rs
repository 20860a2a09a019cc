use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries;
use crate::models::timeslot::{format_hhmm, is_valid_date, parse_hhmm};
use crate::models::{Booking, SalonConfig};

/// Candidate start times (minutes since midnight) for a service of
/// `duration` minutes on `date`. Walks the grid from opening to closing
/// in `time_step` increments and stops as soon as the buffered end of a
/// candidate would pass closing time, so every slot admits the buffered
/// service entirely within opening hours. Empty on closed days.
pub fn generate_slots(date: &str, duration: i64, config: &SalonConfig) -> Vec<i64> {
    let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
        return vec![];
    };
    if config.is_closed_on(day, date) {
        return vec![];
    }

    let opening = config.opening_minutes();
    let closing = config.closing_minutes();

    let mut slots = vec![];
    let mut current = opening;
    // A candidate exactly at closing time is allowed into the loop but
    // the buffered-end check rejects it for any positive duration.
    while current <= closing {
        if current + duration + config.buffer_time > closing {
            break;
        }
        slots.push(current);
        current += config.time_step;
    }
    slots
}

/// Count existing bookings whose buffered interval overlaps the
/// half-open candidate interval `[slot_start, slot_end)`. `slot_end`
/// must already include the buffer; each existing booking's end is
/// extended by `buffer_time` before the overlap test. Bookings with
/// unparseable times never count.
pub fn count_conflicts(
    slot_start: i64,
    slot_end: i64,
    bookings: &[Booking],
    buffer_time: i64,
) -> usize {
    bookings
        .iter()
        .filter(|booking| {
            match (
                parse_hhmm(&booking.start_time),
                parse_hhmm(&booking.end_time),
            ) {
                (Some(existing_start), Some(existing_end)) => {
                    slot_start < existing_end + buffer_time && existing_start < slot_end
                }
                _ => false,
            }
        })
        .count()
}

/// Open start times for `(date, service_duration)`, ascending. The read
/// path fails soft: any invalid input or store failure yields an empty
/// list, since an empty calendar is a safe answer for a booking UI.
pub fn available_slots(
    conn: &Connection,
    today: NaiveDate,
    date: &str,
    service_duration: i64,
) -> Vec<String> {
    match compute_slots(conn, today, date, service_duration) {
        Ok(slots) => slots,
        Err(e) => {
            tracing::error!(error = %e, date, service_duration, "failed to compute available slots");
            Vec::new()
        }
    }
}

fn compute_slots(
    conn: &Connection,
    today: NaiveDate,
    date: &str,
    service_duration: i64,
) -> anyhow::Result<Vec<String>> {
    if service_duration <= 0 {
        tracing::warn!(service_duration, date, "invalid service duration");
        return Ok(vec![]);
    }
    if !is_valid_date(date) {
        tracing::warn!(date, "invalid date format");
        return Ok(vec![]);
    }
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")?;
    if day < today {
        tracing::warn!(date, "requested slots for past date");
        return Ok(vec![]);
    }

    let config = SalonConfig::resolve(queries::get_stored_config(conn)?.as_ref());

    let bookings: Vec<Booking> = queries::get_bookings_for_date(conn, date)?
        .into_iter()
        .filter(|b| b.status.counts_toward_capacity())
        .collect();

    let mut open = vec![];
    for start in generate_slots(date, service_duration, &config) {
        let slot_end = start + service_duration + config.buffer_time;
        let conflicts = count_conflicts(start, slot_end, &bookings, config.buffer_time);
        // Up to `resources` bookings may share any instant.
        if conflicts < config.resources as usize {
            open.push(format_hhmm(start));
        }
    }

    tracing::info!(date, service_duration, slots = open.len(), "available slots computed");
    Ok(open)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{BookingStatus, StoredSalonConfig};
    use chrono::Utc;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn save_config(conn: &Connection, stored: &StoredSalonConfig) {
        queries::save_stored_config(conn, stored).unwrap();
    }

    fn scenario_config(resources: i64) -> StoredSalonConfig {
        StoredSalonConfig {
            opening_time: Some("09:00".to_string()),
            closing_time: Some("10:00".to_string()),
            time_step: Some(15),
            resources: Some(resources),
            buffer_time: Some(0),
            ..Default::default()
        }
    }

    fn insert_booking(conn: &Connection, date: &str, start: &str, end: &str, status: BookingStatus) {
        let now = Utc::now().naive_utc();
        let booking = Booking {
            id: uuid::Uuid::new_v4().to_string(),
            date: date.to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            status,
            customer_id: "cust-1".to_string(),
            service_id: "svc-1".to_string(),
            service_name: None,
            service_price: None,
            customer_name: None,
            customer_email: None,
            rejection_reason: None,
            alternative_slots: vec![],
            selected_alternative_slot: None,
            confirmed_by: None,
            rejected_by: None,
            created_at: now,
            updated_at: now,
        };
        queries::create_booking(conn, &booking).unwrap();
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn test_slot_count_formula_with_defaults() {
        // floor((closing - opening - duration - buffer) / step) + 1
        // = floor((600 - 30 - 10) / 15) + 1 = 38
        let config = SalonConfig::default();
        let slots = generate_slots("2025-06-16", 30, &config);
        assert_eq!(slots.len(), 38);
        assert_eq!(slots.first(), Some(&(9 * 60)));
    }

    #[test]
    fn test_no_slots_when_day_too_short() {
        let config = SalonConfig {
            opening_time: "09:00".to_string(),
            closing_time: "09:30".to_string(),
            buffer_time: 0,
            ..Default::default()
        };
        assert!(generate_slots("2025-06-16", 45, &config).is_empty());
    }

    #[test]
    fn test_closing_time_is_effectively_exclusive() {
        // The last admissible start leaves room for duration + buffer;
        // a start at closing itself is always rejected.
        let config = SalonConfig {
            opening_time: "09:00".to_string(),
            closing_time: "09:30".to_string(),
            time_step: 15,
            buffer_time: 0,
            ..Default::default()
        };
        let slots = generate_slots("2025-06-16", 30, &config);
        assert_eq!(slots, vec![9 * 60]);
    }

    #[test]
    fn test_generate_slots_closed_date() {
        let config = SalonConfig {
            closed_dates: vec!["2025-06-16".to_string()],
            ..Default::default()
        };
        assert!(generate_slots("2025-06-16", 30, &config).is_empty());
    }

    #[test]
    fn test_generate_slots_closed_weekday() {
        // 2025-06-15 is a Sunday (weekday 0).
        let config = SalonConfig {
            closed_days_of_week: vec![0],
            ..Default::default()
        };
        assert!(generate_slots("2025-06-15", 30, &config).is_empty());
        assert!(!generate_slots("2025-06-16", 30, &config).is_empty());
    }

    #[test]
    fn test_count_conflicts_half_open_overlap() {
        let conn = setup_db();
        insert_booking(&conn, "2025-06-16", "09:00", "09:30", BookingStatus::Pending);
        let bookings = queries::get_bookings_for_date(&conn, "2025-06-16").unwrap();

        // Candidate 09:15-09:45: 09:15 < 09:30 and 09:00 < 09:45.
        assert_eq!(count_conflicts(555, 585, &bookings, 0), 1);
        // Candidate 09:30-10:00 starts exactly at the existing end.
        assert_eq!(count_conflicts(570, 600, &bookings, 0), 0);
        // With a 10 minute buffer the existing booking extends to 09:40.
        assert_eq!(count_conflicts(570, 600, &bookings, 10), 1);
    }

    #[test]
    fn test_available_slots_scenario() {
        // opening 09:00, closing 10:00, step 15, resources 1, buffer 0,
        // duration 30 => 09:00, 09:15, 09:30.
        let conn = setup_db();
        save_config(&conn, &scenario_config(1));

        let slots = available_slots(&conn, today(), "2025-06-16", 30);
        assert_eq!(slots, vec!["09:00", "09:15", "09:30"]);

        // Booking 09:00-09:30 overlaps 09:00 and 09:15 but not 09:30.
        insert_booking(&conn, "2025-06-16", "09:00", "09:30", BookingStatus::Pending);
        let slots = available_slots(&conn, today(), "2025-06-16", 30);
        assert_eq!(slots, vec!["09:30"]);
    }

    #[test]
    fn test_available_slots_capacity_rule() {
        // Two bookings at 09:00 fill resources=2; a third of the
        // parallel stations (resources=3) leaves the slot open.
        let conn = setup_db();
        save_config(&conn, &scenario_config(2));
        insert_booking(&conn, "2025-06-16", "09:00", "09:30", BookingStatus::Pending);
        insert_booking(&conn, "2025-06-16", "09:00", "09:30", BookingStatus::Confirmed);

        let slots = available_slots(&conn, today(), "2025-06-16", 30);
        assert!(!slots.contains(&"09:00".to_string()));

        save_config(&conn, &scenario_config(3));
        let slots = available_slots(&conn, today(), "2025-06-16", 30);
        assert!(slots.contains(&"09:00".to_string()));
    }

    #[test]
    fn test_rejected_bookings_never_block() {
        let conn = setup_db();
        save_config(&conn, &scenario_config(1));
        insert_booking(&conn, "2025-06-16", "09:00", "09:30", BookingStatus::Rejected);
        insert_booking(&conn, "2025-06-16", "09:00", "09:30", BookingStatus::Cancelled);

        let slots = available_slots(&conn, today(), "2025-06-16", 30);
        assert_eq!(slots, vec!["09:00", "09:15", "09:30"]);
    }

    #[test]
    fn test_invalid_inputs_yield_empty() {
        let conn = setup_db();
        assert!(available_slots(&conn, today(), "2025-6-16", 30).is_empty());
        assert!(available_slots(&conn, today(), "not a date", 30).is_empty());
        assert!(available_slots(&conn, today(), "2025-06-16", 0).is_empty());
        assert!(available_slots(&conn, today(), "2025-06-16", -15).is_empty());
        // Past date; today itself stays bookable.
        assert!(available_slots(&conn, today(), "2025-05-31", 30).is_empty());
        assert!(!available_slots(&conn, today(), "2025-06-01", 30).is_empty());
    }

    #[test]
    fn test_available_slots_idempotent() {
        let conn = setup_db();
        save_config(&conn, &scenario_config(2));
        insert_booking(&conn, "2025-06-16", "09:00", "09:30", BookingStatus::Pending);

        let first = available_slots(&conn, today(), "2025-06-16", 30);
        let second = available_slots(&conn, today(), "2025-06-16", 30);
        assert_eq!(first, second);
    }

    #[test]
    fn test_admitted_slots_all_below_capacity() {
        let conn = setup_db();
        save_config(&conn, &scenario_config(2));
        insert_booking(&conn, "2025-06-16", "09:00", "09:30", BookingStatus::Pending);
        insert_booking(&conn, "2025-06-16", "09:15", "09:45", BookingStatus::Confirmed);

        let bookings: Vec<Booking> = queries::get_bookings_for_date(&conn, "2025-06-16")
            .unwrap()
            .into_iter()
            .filter(|b| b.status.counts_toward_capacity())
            .collect();

        for slot in available_slots(&conn, today(), "2025-06-16", 30) {
            let start = parse_hhmm(&slot).unwrap();
            assert!(count_conflicts(start, start + 30, &bookings, 0) < 2);
        }
    }
}
