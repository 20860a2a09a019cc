use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::services::availability;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SlotsQuery {
    pub date: String,
    pub service_id: String,
}

#[derive(Serialize)]
pub struct SlotsResponse {
    pub date: String,
    pub slots: Vec<String>,
}

/// GET /api/slots — open start times for a date and service. Fails soft
/// to an empty list on any error.
pub async fn get_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotsQuery>,
) -> Json<SlotsResponse> {
    let today = state.clock.today();
    let slots = {
        let db = state.db.lock().unwrap();
        match queries::get_service(&db, &query.service_id) {
            Ok(Some(service)) if service.active => {
                availability::available_slots(&db, today, &query.date, service.duration)
            }
            Ok(_) => {
                tracing::warn!(service_id = %query.service_id, "slots requested for unknown or inactive service");
                Vec::new()
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load service for slots request");
                Vec::new()
            }
        }
    };

    Json(SlotsResponse {
        date: query.date,
        slots,
    })
}

/// GET /api/services — active services bookable by customers.
pub async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<crate::models::Service>> {
    let services = {
        let db = state.db.lock().unwrap();
        queries::list_active_services(&db).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to list services");
            Vec::new()
        })
    };
    Json(services)
}
