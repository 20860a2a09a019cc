use crate::db::queries;
use crate::errors::AppError;
use crate::models::{AlternativeSlot, Booking, BookingStatus, Customer};
use crate::services::notify::NotificationKind;
use crate::state::AppState;

/// Fixed reason stamped when a customer declines every proposed slot.
pub const DECLINED_ALTERNATIVES_REASON: &str = "Customer declined the proposed alternative slots";

/// Admin confirms a booking, from PENDING or ALTERNATIVE_PROPOSED.
pub async fn approve(state: &AppState, id: &str, admin_id: Option<&str>) -> Result<Booking, AppError> {
    let (booking, customer) = {
        let db = state.db.lock().unwrap();
        let mut booking = load(&db, id)?;
        ensure_status(
            &booking,
            &[BookingStatus::Pending, BookingStatus::AlternativeProposed],
        )?;

        booking.status = BookingStatus::Confirmed;
        booking.confirmed_by = Some(admin_id.unwrap_or("unknown").to_string());
        booking.updated_at = state.clock.now();
        queries::update_booking(&db, &booking)?;

        let customer = queries::get_customer(&db, &booking.customer_id)?;
        (booking, customer)
    };

    tracing::info!(booking_id = id, "booking approved");
    dispatch(state, NotificationKind::BookingConfirmed, &booking, customer.as_ref(), &[]).await;
    Ok(booking)
}

/// Admin rejects a booking, from PENDING or ALTERNATIVE_PROPOSED.
pub async fn reject(
    state: &AppState,
    id: &str,
    admin_id: Option<&str>,
    reason: Option<&str>,
) -> Result<Booking, AppError> {
    let (booking, customer) = {
        let db = state.db.lock().unwrap();
        let mut booking = load(&db, id)?;
        ensure_status(
            &booking,
            &[BookingStatus::Pending, BookingStatus::AlternativeProposed],
        )?;

        booking.status = BookingStatus::Rejected;
        booking.rejected_by = Some(admin_id.unwrap_or("unknown").to_string());
        booking.rejection_reason = reason.map(str::to_string);
        booking.updated_at = state.clock.now();
        queries::update_booking(&db, &booking)?;

        let customer = queries::get_customer(&db, &booking.customer_id)?;
        (booking, customer)
    };

    tracing::info!(booking_id = id, reason, "booking rejected");
    dispatch(state, NotificationKind::BookingRejected, &booking, customer.as_ref(), &[]).await;
    Ok(booking)
}

/// Admin proposes 1-3 alternative slots for a PENDING booking. The
/// proposed slots are plain tuples; no availability validation is run
/// on them.
pub async fn propose_alternatives(
    state: &AppState,
    id: &str,
    slots: Vec<AlternativeSlot>,
) -> Result<Booking, AppError> {
    if slots.is_empty() {
        return Err(AppError::Validation(
            "at least one alternative slot is required".to_string(),
        ));
    }
    if slots.len() > 3 {
        return Err(AppError::Validation(
            "at most 3 alternative slots can be proposed".to_string(),
        ));
    }

    let (booking, customer) = {
        let db = state.db.lock().unwrap();
        let mut booking = load(&db, id)?;
        ensure_status(&booking, &[BookingStatus::Pending])?;

        booking.status = BookingStatus::AlternativeProposed;
        booking.alternative_slots = slots;
        booking.updated_at = state.clock.now();
        queries::update_booking(&db, &booking)?;

        let customer = queries::get_customer(&db, &booking.customer_id)?;
        (booking, customer)
    };

    tracing::info!(
        booking_id = id,
        slots = booking.alternative_slots.len(),
        "alternatives proposed"
    );
    dispatch(
        state,
        NotificationKind::AlternativesProposed,
        &booking,
        customer.as_ref(),
        &booking.alternative_slots,
    )
    .await;
    Ok(booking)
}

/// Customer accepts one of the proposed slots. The selected slot must
/// match a stored alternative by date and start time; on acceptance it
/// becomes the booking's primary date/time and the proposal list is
/// cleared.
pub async fn accept_alternative(
    state: &AppState,
    id: &str,
    selected: AlternativeSlot,
) -> Result<Booking, AppError> {
    let (booking, customer) = {
        let db = state.db.lock().unwrap();
        let mut booking = load(&db, id)?;
        ensure_status(&booking, &[BookingStatus::AlternativeProposed])?;

        let matches_proposal = booking
            .alternative_slots
            .iter()
            .any(|slot| slot.date == selected.date && slot.start_time == selected.start_time);
        if !matches_proposal {
            return Err(AppError::Validation(
                "the selected slot is not among the proposed alternatives".to_string(),
            ));
        }

        booking.date = selected.date.clone();
        booking.start_time = selected.start_time.clone();
        booking.end_time = selected.end_time.clone();
        booking.status = BookingStatus::Confirmed;
        booking.selected_alternative_slot = Some(selected);
        booking.alternative_slots = vec![];
        booking.updated_at = state.clock.now();
        queries::update_booking(&db, &booking)?;

        let customer = queries::get_customer(&db, &booking.customer_id)?;
        (booking, customer)
    };

    tracing::info!(booking_id = id, date = %booking.date, start_time = %booking.start_time, "alternative slot accepted");
    dispatch(state, NotificationKind::BookingConfirmed, &booking, customer.as_ref(), &[]).await;
    Ok(booking)
}

/// Customer declines all proposed slots; the booking is terminally
/// rejected with a fixed system reason.
pub async fn decline_alternatives(state: &AppState, id: &str) -> Result<Booking, AppError> {
    let (booking, customer) = {
        let db = state.db.lock().unwrap();
        let mut booking = load(&db, id)?;
        ensure_status(&booking, &[BookingStatus::AlternativeProposed])?;

        booking.status = BookingStatus::Rejected;
        booking.rejection_reason = Some(DECLINED_ALTERNATIVES_REASON.to_string());
        booking.alternative_slots = vec![];
        booking.updated_at = state.clock.now();
        queries::update_booking(&db, &booking)?;

        let customer = queries::get_customer(&db, &booking.customer_id)?;
        (booking, customer)
    };

    tracing::info!(booking_id = id, "alternative slots declined");
    dispatch(state, NotificationKind::BookingRejected, &booking, customer.as_ref(), &[]).await;
    Ok(booking)
}

fn load(db: &rusqlite::Connection, id: &str) -> Result<Booking, AppError> {
    queries::get_booking_by_id(db, id)?
        .ok_or_else(|| AppError::NotFound("booking not found".to_string()))
}

fn ensure_status(booking: &Booking, allowed: &[BookingStatus]) -> Result<(), AppError> {
    if allowed.contains(&booking.status) {
        Ok(())
    } else {
        Err(AppError::StateConflict {
            status: booking.status.as_str().to_string(),
        })
    }
}

/// Best-effort notification dispatch; failures are logged, never
/// escalated, and never revert the state transition.
async fn dispatch(
    state: &AppState,
    kind: NotificationKind,
    booking: &Booking,
    customer: Option<&Customer>,
    alternatives: &[AlternativeSlot],
) {
    let Some(customer) = customer else {
        return;
    };
    if let Err(e) = state.notifier.send(kind, booking, customer, alternatives).await {
        tracing::warn!(error = %e, booking_id = %booking.id, "notification dispatch failed");
    }
}
