use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{AlternativeSlot, Booking};
use crate::services::{admission, lifecycle};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub service_id: String,
    pub date: String,
    pub start_time: String,
    pub customer_id: String,
}

#[derive(Serialize)]
pub struct CreateBookingResponse {
    pub id: String,
}

/// POST /api/bookings — admit a new booking in PENDING state.
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<Json<CreateBookingResponse>, AppError> {
    let input = admission::CreateBookingInput {
        service_id: request.service_id,
        date: request.date,
        start_time: request.start_time,
        customer_id: request.customer_id,
    };

    let booking = {
        let mut db = state.db.lock().unwrap();
        admission::create_booking(&mut db, state.clock.as_ref(), &input)?
    };

    Ok(Json(CreateBookingResponse { id: booking.id }))
}

/// GET /api/customers/:id/bookings
pub async fn customer_bookings(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = {
        let db = state.db.lock().unwrap();
        queries::get_bookings_for_customer(&db, &customer_id)?
    };
    Ok(Json(bookings))
}

/// POST /api/bookings/:id/alternative/accept
pub async fn accept_alternative(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(slot): Json<AlternativeSlot>,
) -> Result<Json<Booking>, AppError> {
    let booking = lifecycle::accept_alternative(&state, &id, slot).await?;
    Ok(Json(booking))
}

/// POST /api/bookings/:id/alternative/reject
pub async fn decline_alternatives(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let booking = lifecycle::decline_alternatives(&state, &id).await?;
    Ok(Json(booking))
}
