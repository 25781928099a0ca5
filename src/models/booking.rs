use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Reservation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            other => Err(other.to_string()),
        }
    }
}

/// Постоянная запись о выкупленном месте. `reservation_id` связывает бронь
/// с оплатой: повторный confirm находит уже созданный booking по нему.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub booking_id: String,
    pub reservation_id: String,
    pub event_id: String,
    pub seat_number: String,
    pub user_id: String,
    pub price: f64,
    pub payment_id: String,
    pub created_at: DateTime<Utc>,
    pub status: BookingStatus,
}

impl Booking {
    /// Booking, выкупающий данную бронь. Цена - снимок из брони.
    pub fn confirmed(
        booking_id: impl Into<String>,
        reservation: &Reservation,
        payment_id: impl Into<String>,
    ) -> Self {
        Booking {
            booking_id: booking_id.into(),
            reservation_id: reservation.reservation_id.clone(),
            event_id: reservation.event_id.clone(),
            seat_number: reservation.seat_number.clone(),
            user_id: reservation.user_id.clone(),
            price: reservation.price,
            payment_id: payment_id.into(),
            created_at: Utc::now(),
            status: BookingStatus::Confirmed,
        }
    }
}
