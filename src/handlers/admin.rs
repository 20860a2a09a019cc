use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{AlternativeSlot, Booking, BookingStatus, SalonConfig, StoredSalonConfig};
use crate::services::lifecycle;
use crate::state::AppState;

#[allow(clippy::result_large_err)]
fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), Response> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "unauthorized"})),
        )
            .into_response());
    }
    Ok(())
}

/// Actor identifier for confirmed_by/rejected_by stamps.
fn actor(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-admin-user")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

// GET /api/admin/bookings/pending
pub async fn pending_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Booking>>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let bookings = {
        let db = state.db.lock().unwrap();
        queries::get_bookings_by_status(&db, BookingStatus::Pending)
            .map_err(|e| AppError::Store(e).into_response())?
    };
    Ok(Json(bookings))
}

// GET /api/admin/bookings?from=YYYY-MM-DD&to=YYYY-MM-DD
#[derive(Deserialize)]
pub struct RangeQuery {
    pub from: String,
    pub to: String,
}

pub async fn bookings_in_range(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<Booking>>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let bookings = {
        let db = state.db.lock().unwrap();
        queries::get_bookings_in_range(&db, &query.from, &query.to)
            .map_err(|e| AppError::Store(e).into_response())?
    };
    Ok(Json(bookings))
}

// GET /api/admin/stats?date=YYYY-MM-DD
#[derive(Deserialize)]
pub struct StatsQuery {
    pub date: String,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub total: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub rejected: i64,
}

pub async fn day_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let stats = {
        let db = state.db.lock().unwrap();
        queries::get_day_stats(&db, &query.date)
            .map_err(|e| AppError::Store(e).into_response())?
    };
    Ok(Json(StatsResponse {
        total: stats.total,
        pending: stats.pending,
        confirmed: stats.confirmed,
        rejected: stats.rejected,
    }))
}

// POST /api/admin/bookings/:id/approve
pub async fn approve_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Booking>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking = lifecycle::approve(&state, &id, actor(&headers).as_deref())
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(Json(booking))
}

// POST /api/admin/bookings/:id/reject
#[derive(Deserialize, Default)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

pub async fn reject_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Option<Json<RejectRequest>>,
) -> Result<Json<Booking>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let reason = body.and_then(|Json(r)| r.reason);
    let booking = lifecycle::reject(&state, &id, actor(&headers).as_deref(), reason.as_deref())
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(Json(booking))
}

// POST /api/admin/bookings/:id/alternatives
#[derive(Deserialize)]
pub struct ProposeRequest {
    pub slots: Vec<AlternativeSlot>,
}

pub async fn propose_alternatives(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ProposeRequest>,
) -> Result<Json<Booking>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking = lifecycle::propose_alternatives(&state, &id, request.slots)
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(Json(booking))
}

// GET /api/admin/settings — the resolved configuration.
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SalonConfig>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let config = {
        let db = state.db.lock().unwrap();
        let stored = queries::get_stored_config(&db)
            .map_err(|e| AppError::Store(e).into_response())?;
        SalonConfig::resolve(stored.as_ref())
    };
    Ok(Json(config))
}

// POST /api/admin/settings — store a partial configuration.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(stored): Json<StoredSalonConfig>,
) -> Result<Json<SalonConfig>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let config = {
        let db = state.db.lock().unwrap();
        queries::save_stored_config(&db, &stored)
            .map_err(|e| AppError::Store(e).into_response())?;
        SalonConfig::resolve(Some(&stored))
    };
    tracing::info!("salon settings updated");
    Ok(Json(config))
}
