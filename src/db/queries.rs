use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    AlternativeSlot, Booking, BookingStatus, Customer, Service, StoredSalonConfig,
};

const BOOKING_COLUMNS: &str = "id, date, start_time, end_time, status, customer_id, service_id, \
     service_name, service_price, customer_name, customer_email, rejection_reason, \
     alternative_slots, selected_alternative_slot, confirmed_by, rejected_by, created_at, updated_at";

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    let alternative_slots = serde_json::to_string(&booking.alternative_slots)?;
    let selected = booking
        .selected_alternative_slot
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    conn.execute(
        &format!("INSERT INTO bookings ({BOOKING_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"),
        params![
            booking.id,
            booking.date,
            booking.start_time,
            booking.end_time,
            booking.status.as_str(),
            booking.customer_id,
            booking.service_id,
            booking.service_name,
            booking.service_price,
            booking.customer_name,
            booking.customer_email,
            booking.rejection_reason,
            alternative_slots,
            selected,
            booking.confirmed_by,
            booking.rejected_by,
            format_ts(&booking.created_at),
            format_ts(&booking.updated_at),
        ],
    )?;
    Ok(())
}

/// Writes every mutable field in one statement; each lifecycle
/// transition is a single atomic document update.
pub fn update_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    let alternative_slots = serde_json::to_string(&booking.alternative_slots)?;
    let selected = booking
        .selected_alternative_slot
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    let count = conn.execute(
        "UPDATE bookings SET date = ?1, start_time = ?2, end_time = ?3, status = ?4,
            rejection_reason = ?5, alternative_slots = ?6, selected_alternative_slot = ?7,
            confirmed_by = ?8, rejected_by = ?9, updated_at = ?10
         WHERE id = ?11",
        params![
            booking.date,
            booking.start_time,
            booking.end_time,
            booking.status.as_str(),
            booking.rejection_reason,
            alternative_slots,
            selected,
            booking.confirmed_by,
            booking.rejected_by,
            format_ts(&booking.updated_at),
            booking.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Unordered fetch by date equality; callers sort in memory.
pub fn get_bookings_for_date(conn: &Connection, date: &str) -> anyhow::Result<Vec<Booking>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE date = ?1"))?;
    let rows = stmt.query_map(params![date], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_bookings_in_range(
    conn: &Connection,
    from: &str,
    to: &str,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE date >= ?1 AND date <= ?2"
    ))?;
    let rows = stmt.query_map(params![from, to], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    sort_by_date_time(&mut bookings);
    Ok(bookings)
}

pub fn get_bookings_by_status(
    conn: &Connection,
    status: BookingStatus,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = ?1"))?;
    let rows = stmt.query_map(params![status.as_str()], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    sort_by_date_time(&mut bookings);
    Ok(bookings)
}

pub fn get_bookings_for_customer(
    conn: &Connection,
    customer_id: &str,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE customer_id = ?1"
    ))?;
    let rows = stmt.query_map(params![customer_id], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    sort_by_date_time(&mut bookings);
    Ok(bookings)
}

fn sort_by_date_time(bookings: &mut [Booking]) {
    bookings.sort_by(|a, b| a.date.cmp(&b.date).then(a.start_time.cmp(&b.start_time)));
}

pub struct DayStats {
    pub total: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub rejected: i64,
}

pub fn get_day_stats(conn: &Connection, date: &str) -> anyhow::Result<DayStats> {
    let bookings = get_bookings_for_date(conn, date)?;

    let mut stats = DayStats {
        total: bookings.len() as i64,
        pending: 0,
        confirmed: 0,
        rejected: 0,
    };
    for booking in &bookings {
        match booking.status {
            BookingStatus::Pending => stats.pending += 1,
            BookingStatus::Confirmed => stats.confirmed += 1,
            BookingStatus::Rejected => stats.rejected += 1,
            _ => {}
        }
    }
    Ok(stats)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let status_str: String = row.get(4)?;
    let alternative_slots_json: Option<String> = row.get(12)?;
    let selected_json: Option<String> = row.get(13)?;
    let created_at_str: String = row.get(16)?;
    let updated_at_str: String = row.get(17)?;

    let alternative_slots: Vec<AlternativeSlot> = alternative_slots_json
        .as_deref()
        .and_then(|json| serde_json::from_str(json).ok())
        .unwrap_or_default();
    let selected_alternative_slot: Option<AlternativeSlot> = selected_json
        .as_deref()
        .and_then(|json| serde_json::from_str(json).ok());

    Ok(Booking {
        id: row.get(0)?,
        date: row.get(1)?,
        start_time: row.get(2)?,
        end_time: row.get(3)?,
        status: BookingStatus::parse(&status_str),
        customer_id: row.get(5)?,
        service_id: row.get(6)?,
        service_name: row.get(7)?,
        service_price: row.get(8)?,
        customer_name: row.get(9)?,
        customer_email: row.get(10)?,
        rejection_reason: row.get(11)?,
        alternative_slots,
        selected_alternative_slot,
        confirmed_by: row.get(14)?,
        rejected_by: row.get(15)?,
        created_at: parse_ts(&created_at_str),
        updated_at: parse_ts(&updated_at_str),
    })
}

fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn parse_ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Services ──

pub fn create_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO services (id, name, duration, price, active) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            service.id,
            service.name,
            service.duration,
            service.price,
            service.active as i32,
        ],
    )?;
    Ok(())
}

pub fn get_service(conn: &Connection, id: &str) -> anyhow::Result<Option<Service>> {
    let result = conn.query_row(
        "SELECT id, name, duration, price, active FROM services WHERE id = ?1",
        params![id],
        |row| {
            Ok(Service {
                id: row.get(0)?,
                name: row.get(1)?,
                duration: row.get(2)?,
                price: row.get(3)?,
                active: row.get::<_, i32>(4)? != 0,
            })
        },
    );

    match result {
        Ok(service) => Ok(Some(service)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_active_services(conn: &Connection) -> anyhow::Result<Vec<Service>> {
    let mut stmt =
        conn.prepare("SELECT id, name, duration, price, active FROM services WHERE active = 1")?;
    let rows = stmt.query_map([], |row| {
        Ok(Service {
            id: row.get(0)?,
            name: row.get(1)?,
            duration: row.get(2)?,
            price: row.get(3)?,
            active: row.get::<_, i32>(4)? != 0,
        })
    })?;

    let mut services = vec![];
    for row in rows {
        services.push(row?);
    }
    services.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(services)
}

// ── Customers ──

pub fn create_customer(conn: &Connection, customer: &Customer) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO customers (id, first_name, last_name, email) VALUES (?1, ?2, ?3, ?4)",
        params![
            customer.id,
            customer.first_name,
            customer.last_name,
            customer.email,
        ],
    )?;
    Ok(())
}

pub fn get_customer(conn: &Connection, id: &str) -> anyhow::Result<Option<Customer>> {
    let result = conn.query_row(
        "SELECT id, first_name, last_name, email FROM customers WHERE id = ?1",
        params![id],
        |row| {
            Ok(Customer {
                id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                email: row.get(3)?,
            })
        },
    );

    match result {
        Ok(customer) => Ok(Some(customer)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Settings ──

pub fn get_stored_config(conn: &Connection) -> anyhow::Result<Option<StoredSalonConfig>> {
    let result = conn.query_row(
        "SELECT data FROM settings WHERE id = 'config'",
        [],
        |row| row.get::<_, String>(0),
    );

    match result {
        Ok(json) => {
            let stored = serde_json::from_str(&json)?;
            Ok(Some(stored))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn save_stored_config(conn: &Connection, config: &StoredSalonConfig) -> anyhow::Result<()> {
    let json = serde_json::to_string(config)?;
    conn.execute(
        "INSERT INTO settings (id, data) VALUES ('config', ?1)
         ON CONFLICT(id) DO UPDATE SET data = excluded.data",
        params![json],
    )?;
    Ok(())
}
