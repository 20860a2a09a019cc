use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::timeslot::AlternativeSlot;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `HH:mm` local wall-clock.
    pub start_time: String,
    /// `HH:mm`, computed once at creation as start + service duration.
    pub end_time: String,
    pub status: BookingStatus,
    pub customer_id: String,
    pub service_id: String,
    // Snapshotted at creation time; later changes to the service or
    // customer record never touch existing bookings.
    pub service_name: Option<String>,
    pub service_price: Option<f64>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub rejection_reason: Option<String>,
    pub alternative_slots: Vec<AlternativeSlot>,
    pub selected_alternative_slot: Option<AlternativeSlot>,
    pub confirmed_by: Option<String>,
    pub rejected_by: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Rejected,
    AlternativeProposed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Rejected => "REJECTED",
            BookingStatus::AlternativeProposed => "ALTERNATIVE_PROPOSED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "CONFIRMED" => BookingStatus::Confirmed,
            "REJECTED" => BookingStatus::Rejected,
            "ALTERNATIVE_PROPOSED" => BookingStatus::AlternativeProposed,
            "CANCELLED" => BookingStatus::Cancelled,
            _ => BookingStatus::Pending,
        }
    }

    /// Only pending and confirmed bookings occupy a resource; rejected
    /// and cancelled ones never block new admissions.
    pub fn counts_toward_capacity(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}
