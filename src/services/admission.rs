use chrono::NaiveDate;
use rusqlite::Connection;
use uuid::Uuid;

use crate::clock::Clock;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::timeslot::{format_hhmm, is_valid_date, parse_hhmm};
use crate::models::{Booking, BookingStatus, SalonConfig};
use crate::services::availability;

const SLOT_TAKEN: &str = "this time slot is no longer available, please pick another time";

#[derive(Debug, Clone)]
pub struct CreateBookingInput {
    pub service_id: String,
    pub date: String,
    pub start_time: String,
    pub customer_id: String,
}

/// Admit a new booking. Re-validates the requested slot at write time:
/// structural checks, service lookup, opening-hours check, a full
/// availability re-run, and a final conflict count against a fresh read
/// of same-day bookings. The final count and the insert share one store
/// transaction, closing the re-read-to-write race window.
pub fn create_booking(
    conn: &mut Connection,
    clock: &dyn Clock,
    input: &CreateBookingInput,
) -> Result<Booking, AppError> {
    validate_input(input, clock.today())?;

    let service = queries::get_service(conn, &input.service_id)?
        .ok_or_else(|| AppError::NotFound("the selected service is not available".to_string()))?;
    if !service.active {
        return Err(AppError::NotFound(
            "the selected service is currently not available".to_string(),
        ));
    }
    if service.duration <= 0 {
        return Err(AppError::Validation(
            "the selected service has an invalid duration".to_string(),
        ));
    }

    let config = SalonConfig::resolve(queries::get_stored_config(conn)?.as_ref());

    // end time is computed once here and never recalculated from the
    // service record again.
    let start = parse_hhmm(&input.start_time)
        .ok_or_else(|| AppError::Validation("invalid time format, expected HH:mm".to_string()))?;
    let end = start + service.duration;
    let end_time = format_hhmm(end);

    if start < config.opening_minutes() || end > config.closing_minutes() {
        tracing::warn!(start_time = %input.start_time, "booking outside opening hours");
        return Err(AppError::Validation(
            "the selected time is outside the salon's opening hours".to_string(),
        ));
    }

    // First defense: the slot must still be in the published set.
    let open = availability::available_slots(conn, clock.today(), &input.date, service.duration);
    if !open.iter().any(|s| s == &input.start_time) {
        tracing::warn!(date = %input.date, start_time = %input.start_time, "slot no longer available");
        return Err(AppError::Capacity(SLOT_TAKEN.to_string()));
    }

    // Second defense: fresh conflict count and insert in one transaction.
    let now = clock.now();
    let tx = conn.transaction().map_err(anyhow::Error::from)?;

    let bookings: Vec<Booking> = queries::get_bookings_for_date(&tx, &input.date)?
        .into_iter()
        .filter(|b| b.status.counts_toward_capacity())
        .collect();
    let slot_end = end + config.buffer_time;
    let conflicts = availability::count_conflicts(start, slot_end, &bookings, config.buffer_time);
    if conflicts >= config.resources as usize {
        tracing::warn!(
            date = %input.date,
            start_time = %input.start_time,
            conflicts,
            resources = config.resources,
            "slot conflict detected at admission"
        );
        return Err(AppError::Capacity(SLOT_TAKEN.to_string()));
    }

    let customer = queries::get_customer(&tx, &input.customer_id)?;

    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        date: input.date.clone(),
        start_time: input.start_time.clone(),
        end_time,
        status: BookingStatus::Pending,
        customer_id: input.customer_id.clone(),
        service_id: input.service_id.clone(),
        service_name: Some(service.name.clone()),
        service_price: Some(service.price),
        customer_name: customer.as_ref().map(|c| c.full_name()),
        customer_email: customer.as_ref().map(|c| c.email.clone()),
        rejection_reason: None,
        alternative_slots: vec![],
        selected_alternative_slot: None,
        confirmed_by: None,
        rejected_by: None,
        created_at: now,
        updated_at: now,
    };
    queries::create_booking(&tx, &booking)?;
    tx.commit().map_err(anyhow::Error::from)?;

    tracing::info!(
        booking_id = %booking.id,
        date = %booking.date,
        start_time = %booking.start_time,
        service_id = %booking.service_id,
        "booking created"
    );
    Ok(booking)
}

fn validate_input(input: &CreateBookingInput, today: NaiveDate) -> Result<(), AppError> {
    if input.service_id.is_empty() {
        return Err(AppError::Validation("service id is required".to_string()));
    }
    if !is_valid_date(&input.date) {
        return Err(AppError::Validation(
            "invalid date format, expected YYYY-MM-DD".to_string(),
        ));
    }
    if parse_hhmm(&input.start_time).is_none() {
        return Err(AppError::Validation(
            "invalid time format, expected HH:mm".to_string(),
        ));
    }
    // parse cannot fail after is_valid_date.
    let day = NaiveDate::parse_from_str(&input.date, "%Y-%m-%d")
        .map_err(|e| AppError::Validation(e.to_string()))?;
    if day < today {
        return Err(AppError::Validation(
            "cannot book appointments in the past".to_string(),
        ));
    }
    if input.customer_id.is_empty() {
        return Err(AppError::Validation("customer id is required".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::db;
    use crate::models::{Customer, Service, StoredSalonConfig};

    fn fixed_clock() -> FixedClock {
        FixedClock(
            NaiveDate::from_ymd_opt(2025, 6, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        )
    }

    fn setup_db() -> Connection {
        let conn = db::init_db(":memory:").unwrap();
        queries::create_service(
            &conn,
            &Service {
                id: "svc-1".to_string(),
                name: "Haircut".to_string(),
                duration: 30,
                price: 25.0,
                active: true,
            },
        )
        .unwrap();
        queries::create_service(
            &conn,
            &Service {
                id: "svc-off".to_string(),
                name: "Retired Treatment".to_string(),
                duration: 30,
                price: 50.0,
                active: false,
            },
        )
        .unwrap();
        queries::create_customer(
            &conn,
            &Customer {
                id: "cust-1".to_string(),
                first_name: "Alice".to_string(),
                last_name: "Rossi".to_string(),
                email: "alice@example.com".to_string(),
            },
        )
        .unwrap();
        conn
    }

    fn input(start_time: &str) -> CreateBookingInput {
        CreateBookingInput {
            service_id: "svc-1".to_string(),
            date: "2025-06-16".to_string(),
            start_time: start_time.to_string(),
            customer_id: "cust-1".to_string(),
        }
    }

    fn save_config(conn: &Connection, resources: i64, buffer: i64) {
        queries::save_stored_config(
            conn,
            &StoredSalonConfig {
                opening_time: Some("09:00".to_string()),
                closing_time: Some("10:00".to_string()),
                time_step: Some(15),
                resources: Some(resources),
                buffer_time: Some(buffer),
                ..Default::default()
            },
        )
        .unwrap();
    }

    #[test]
    fn test_create_booking_end_time_round_trip() {
        let mut conn = setup_db();
        save_config(&conn, 1, 0);

        let booking = create_booking(&mut conn, &fixed_clock(), &input("09:15")).unwrap();
        assert_eq!(booking.start_time, "09:15");
        assert_eq!(booking.end_time, "09:45");
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.service_name.as_deref(), Some("Haircut"));
        assert_eq!(booking.service_price, Some(25.0));
        assert_eq!(booking.customer_name.as_deref(), Some("Alice Rossi"));
        assert_eq!(booking.customer_email.as_deref(), Some("alice@example.com"));

        let stored = queries::get_booking_by_id(&conn, &booking.id).unwrap().unwrap();
        assert_eq!(stored.end_time, "09:45");
    }

    #[test]
    fn test_validation_failures() {
        let mut conn = setup_db();
        let clock = fixed_clock();

        let mut bad = input("09:00");
        bad.date = "16-06-2025".to_string();
        assert!(matches!(
            create_booking(&mut conn, &clock, &bad),
            Err(AppError::Validation(_))
        ));

        let bad = input("9am");
        assert!(matches!(
            create_booking(&mut conn, &clock, &bad),
            Err(AppError::Validation(_))
        ));

        let mut bad = input("09:00");
        bad.date = "2025-05-20".to_string();
        assert!(matches!(
            create_booking(&mut conn, &clock, &bad),
            Err(AppError::Validation(_))
        ));

        let mut bad = input("09:00");
        bad.customer_id = String::new();
        assert!(matches!(
            create_booking(&mut conn, &clock, &bad),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_or_inactive_service_rejected() {
        let mut conn = setup_db();
        save_config(&conn, 1, 0);
        let clock = fixed_clock();

        let mut req = input("09:00");
        req.service_id = "nope".to_string();
        assert!(matches!(
            create_booking(&mut conn, &clock, &req),
            Err(AppError::NotFound(_))
        ));

        let mut req = input("09:00");
        req.service_id = "svc-off".to_string();
        assert!(matches!(
            create_booking(&mut conn, &clock, &req),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_outside_opening_hours_rejected() {
        let mut conn = setup_db();
        save_config(&conn, 1, 0);
        let clock = fixed_clock();

        assert!(matches!(
            create_booking(&mut conn, &clock, &input("08:00")),
            Err(AppError::Validation(_))
        ));
        // 09:45 + 30 minutes runs past the 10:00 close.
        assert!(matches!(
            create_booking(&mut conn, &clock, &input("09:45")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_capacity_exhaustion() {
        let mut conn = setup_db();
        save_config(&conn, 2, 0);
        let clock = fixed_clock();

        create_booking(&mut conn, &clock, &input("09:00")).unwrap();
        create_booking(&mut conn, &clock, &input("09:00")).unwrap();
        // Third request: conflicts = 2 >= resources = 2.
        assert!(matches!(
            create_booking(&mut conn, &clock, &input("09:00")),
            Err(AppError::Capacity(_))
        ));

        save_config(&conn, 3, 0);
        assert!(create_booking(&mut conn, &clock, &input("09:00")).is_ok());
    }

    #[test]
    fn test_admitted_booking_blocks_overlapping_slot() {
        let mut conn = setup_db();
        save_config(&conn, 1, 0);
        let clock = fixed_clock();

        create_booking(&mut conn, &clock, &input("09:00")).unwrap();
        // 09:15 overlaps the 09:00-09:30 booking.
        assert!(matches!(
            create_booking(&mut conn, &clock, &input("09:15")),
            Err(AppError::Capacity(_))
        ));
        // 09:30 starts exactly at the previous end, no overlap.
        assert!(create_booking(&mut conn, &clock, &input("09:30")).is_ok());
    }

    #[test]
    fn test_unknown_customer_still_booked_without_snapshot() {
        let mut conn = setup_db();
        save_config(&conn, 1, 0);
        let clock = fixed_clock();

        let mut req = input("09:00");
        req.customer_id = "ghost".to_string();
        let booking = create_booking(&mut conn, &clock, &req).unwrap();
        assert_eq!(booking.customer_name, None);
        assert_eq!(booking.customer_email, None);
    }
}
