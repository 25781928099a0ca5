use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::models::SeatStatus;
use crate::AppState;

use super::failure_reply;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/seats", get(get_seats))
        .route("/seats/reserve", post(reserve_seat))
        .route("/seats/release", post(release_seat))
        .route("/seats/initialize", post(initialize_seats))
}

/* ---------- SEATS ---------- */

#[derive(Debug, Deserialize)]
struct SeatsQuery {
    event_id: String,
    status: Option<String>, // AVAILABLE | RESERVED | BOOKED
    limit: Option<i64>,
}

// GET /api/seats
async fn get_seats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SeatsQuery>,
) -> Result<Json<Value>, (StatusCode, String)> {
    if params.event_id.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "event_id не должен быть пустым".to_string(),
        ));
    }

    let status = match params.status.as_deref() {
        None => None,
        Some(raw) => Some(raw.parse::<SeatStatus>().map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                "status должен быть AVAILABLE | RESERVED | BOOKED".to_string(),
            )
        })?),
    };

    match state
        .inventory
        .get_seats(&params.event_id, status, params.limit)
        .await
    {
        Ok((seats, has_more)) => Ok(Json(json!({
            "success": true,
            "seats": seats,
            "has_more": has_more,
        }))),
        Err(err) => failure_reply("get_seats", err),
    }
}

// POST /api/seats/reserve
#[derive(Debug, Deserialize)]
struct ReserveSeatRequest {
    event_id: String,
    seat_number: String,
    user_id: String,
}

async fn reserve_seat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReserveSeatRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    if req.event_id.is_empty() || req.seat_number.is_empty() || req.user_id.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "event_id, seat_number и user_id не должны быть пустыми".to_string(),
        ));
    }

    let reservation_id = match state
        .inventory
        .reserve_seat(&req.event_id, &req.seat_number, &req.user_id)
        .await
    {
        Ok(id) => id,
        Err(err) => return failure_reply("reserve_seat", err),
    };

    // снимок места для ответа; бронь уже состоялась, сбой снимка не фатален
    let seat = match state.inventory.get_seat(&req.event_id, &req.seat_number).await {
        Ok(seat) => Some(seat),
        Err(err) => {
            tracing::warn!(
                "failed to read seat snapshot {}/{}: {}",
                req.event_id,
                req.seat_number,
                err
            );
            None
        }
    };

    Ok(Json(json!({
        "success": true,
        "message": "Место успешно зарезервировано",
        "seat": seat,
        "reservation_id": reservation_id,
    })))
}

// POST /api/seats/release
#[derive(Debug, Deserialize)]
struct ReleaseSeatRequest {
    event_id: String,
    seat_number: String,
    user_id: String,
}

async fn release_seat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReleaseSeatRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    if req.event_id.is_empty() || req.seat_number.is_empty() || req.user_id.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "event_id, seat_number и user_id не должны быть пустыми".to_string(),
        ));
    }

    match state
        .inventory
        .release_seat(&req.event_id, &req.seat_number, &req.user_id)
        .await
    {
        Ok(()) => Ok(Json(json!({
            "success": true,
            "message": "Место успешно освобождено",
        }))),
        Err(err) => failure_reply("release_seat", err),
    }
}

// POST /api/seats/initialize
#[derive(Debug, Deserialize)]
struct InitializeSeatsRequest {
    event_id: String,
    total_seats: u32,
    price: f64,
}

async fn initialize_seats(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InitializeSeatsRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    if req.event_id.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "event_id не должен быть пустым".to_string(),
        ));
    }
    if req.total_seats == 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "total_seats должен быть > 0".to_string(),
        ));
    }
    if !req.price.is_finite() || req.price < 0.0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "price должен быть неотрицательным числом".to_string(),
        ));
    }

    match state
        .inventory
        .initialize_seats(&req.event_id, req.total_seats, req.price)
        .await
    {
        Ok(created) => Ok(Json(json!({
            "success": true,
            "message": "Места успешно инициализированы",
            "created_count": created,
        }))),
        Err(err) => failure_reply("initialize_seats", err),
    }
}
