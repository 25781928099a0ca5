use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::AppState;

use super::failure_reply;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings/confirm", post(confirm_booking))
        .route("/bookings", get(get_bookings))
        .route("/reservations", get(get_reservations))
        .route("/reservations/{reservation_id}/booking", get(get_reservation_booking))
}

/* ---------- BOOKINGS ---------- */

// POST /api/bookings/confirm
#[derive(Debug, Deserialize)]
struct ConfirmBookingRequest {
    reservation_id: String,
    user_id: String,
    payment_id: String,
}

async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ConfirmBookingRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    if req.reservation_id.is_empty() || req.user_id.is_empty() || req.payment_id.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "reservation_id, user_id и payment_id не должны быть пустыми".to_string(),
        ));
    }

    match state
        .inventory
        .confirm_booking(&req.reservation_id, &req.user_id, &req.payment_id)
        .await
    {
        Ok(booking_id) => Ok(Json(json!({
            "success": true,
            "message": "Выкуп успешно подтверждён",
            "booking_id": booking_id,
        }))),
        Err(err) => failure_reply("confirm_booking", err),
    }
}

// вторичные выборки: ровно один из user_id / event_id
#[derive(Debug, Deserialize)]
struct SecondaryLookupQuery {
    user_id: Option<String>,
    event_id: Option<String>,
}

impl SecondaryLookupQuery {
    fn validate(&self) -> Result<(), (StatusCode, String)> {
        let user = self.user_id.as_deref().unwrap_or_default();
        let event = self.event_id.as_deref().unwrap_or_default();
        if user.is_empty() == event.is_empty() {
            return Err((
                StatusCode::BAD_REQUEST,
                "нужен ровно один из параметров user_id или event_id".to_string(),
            ));
        }
        Ok(())
    }
}

// GET /api/bookings?user_id=... | ?event_id=...
async fn get_bookings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SecondaryLookupQuery>,
) -> Result<Json<Value>, (StatusCode, String)> {
    params.validate()?;

    let result = match (&params.user_id, &params.event_id) {
        (Some(user_id), _) if !user_id.is_empty() => state.inventory.user_bookings(user_id).await,
        (_, Some(event_id)) => state.inventory.event_bookings(event_id).await,
        _ => unreachable!("validate guarantees one parameter"),
    };

    match result {
        Ok(bookings) => Ok(Json(json!({
            "success": true,
            "bookings": bookings,
        }))),
        Err(err) => failure_reply("get_bookings", err),
    }
}

// GET /api/reservations?user_id=... | ?event_id=...
async fn get_reservations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SecondaryLookupQuery>,
) -> Result<Json<Value>, (StatusCode, String)> {
    params.validate()?;

    let result = match (&params.user_id, &params.event_id) {
        (Some(user_id), _) if !user_id.is_empty() => {
            state.inventory.user_reservations(user_id).await
        }
        (_, Some(event_id)) => state.inventory.event_reservations(event_id).await,
        _ => unreachable!("validate guarantees one parameter"),
    };

    match result {
        Ok(reservations) => Ok(Json(json!({
            "success": true,
            "reservations": reservations,
        }))),
        Err(err) => failure_reply("get_reservations", err),
    }
}

// GET /api/reservations/{reservation_id}/booking
// Ответ на повторный confirm: booking, созданный по этой брони
async fn get_reservation_booking(
    State(state): State<Arc<AppState>>,
    Path(reservation_id): Path<String>,
) -> Result<Json<Value>, (StatusCode, String)> {
    match state.inventory.booking_for_reservation(&reservation_id).await {
        Ok(Some(booking)) => Ok(Json(json!({
            "success": true,
            "booking": booking,
        }))),
        Ok(None) => Ok(Json(json!({
            "success": false,
            "message": "Выкуп по этой брони не найден",
        }))),
        Err(err) => failure_reply("get_reservation_booking", err),
    }
}
