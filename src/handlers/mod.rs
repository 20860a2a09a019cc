pub mod admin;
pub mod bookings;
pub mod health;
pub mod slots;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/services", get(slots::list_services))
        .route("/api/slots", get(slots::get_slots))
        .route("/api/bookings", post(bookings::create_booking))
        .route(
            "/api/customers/:id/bookings",
            get(bookings::customer_bookings),
        )
        .route(
            "/api/bookings/:id/alternative/accept",
            post(bookings::accept_alternative),
        )
        .route(
            "/api/bookings/:id/alternative/reject",
            post(bookings::decline_alternatives),
        )
        .route("/api/admin/bookings/pending", get(admin::pending_bookings))
        .route("/api/admin/bookings", get(admin::bookings_in_range))
        .route("/api/admin/stats", get(admin::day_stats))
        .route(
            "/api/admin/bookings/:id/approve",
            post(admin::approve_booking),
        )
        .route(
            "/api/admin/bookings/:id/reject",
            post(admin::reject_booking),
        )
        .route(
            "/api/admin/bookings/:id/alternatives",
            post(admin::propose_alternatives),
        )
        .route("/api/admin/settings", get(admin::get_settings))
        .route("/api/admin/settings", post(admin::update_settings))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
