pub mod bookings;
pub mod seats;

use axum::http::StatusCode;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::InventoryError;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(seats::routes())
        .merge(bookings::routes())
}

/* ---------- helpers ---------- */

// Бизнес-ошибки уходят клиенту как success=false с читаемым сообщением,
// инфраструктурные - как протокольный 500
pub(crate) fn business_message(err: &InventoryError) -> &'static str {
    match err {
        InventoryError::SeatNotFound => "Место не найдено",
        InventoryError::SeatNotAvailable => "Место уже занято",
        InventoryError::NotOwnerOrNotReserved => "Место не зарезервировано вами",
        InventoryError::ReservationNotFound => "Бронь не найдена",
        InventoryError::ReservationExpired => "Срок брони истёк",
        InventoryError::ReservationNotPending => {
            "Бронь уже обработана; booking доступен по идентификатору брони"
        }
        InventoryError::NotOwner => "Бронь не принадлежит вам",
        InventoryError::Contended => "Место обрабатывается другим запросом, попробуйте ещё раз",
        InventoryError::SeatStateDrift => "Состояние места изменилось, запрос больше недействителен",
        _ => "Внутренняя ошибка",
    }
}

pub(crate) fn failure_reply(
    op: &'static str,
    err: InventoryError,
) -> Result<Json<Value>, (StatusCode, String)> {
    if err.is_business() {
        // retryable подсказывает клиенту, имеет ли смысл повтор с backoff
        Ok(Json(json!({
            "success": false,
            "message": business_message(&err),
            "retryable": err.is_retryable(),
        })))
    } else {
        tracing::error!("{} failed: {}", op, err);
        Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Внутренняя ошибка сервера".to_string(),
        ))
    }
}
