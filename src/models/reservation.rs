use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Expired,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Confirmed => "CONFIRMED",
            ReservationStatus::Cancelled => "CANCELLED",
            ReservationStatus::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ReservationStatus::Pending),
            "CONFIRMED" => Ok(ReservationStatus::Confirmed),
            "CANCELLED" => Ok(ReservationStatus::Cancelled),
            "EXPIRED" => Ok(ReservationStatus::Expired),
            other => Err(other.to_string()),
        }
    }
}

/// Временная бронь места в ожидании оплаты. Создаётся только в PENDING,
/// переходы PENDING -> {CONFIRMED, CANCELLED, EXPIRED} терминальны.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub reservation_id: String,
    pub event_id: String,
    pub seat_number: String,
    pub user_id: String,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: ReservationStatus,
}

impl Reservation {
    pub fn with_ttl(
        reservation_id: impl Into<String>,
        event_id: impl Into<String>,
        seat_number: impl Into<String>,
        user_id: impl Into<String>,
        price: f64,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        Reservation {
            reservation_id: reservation_id.into(),
            event_id: event_id.into(),
            seat_number: seat_number.into(),
            user_id: user_id.into(),
            price,
            created_at: now,
            expires_at: now + ttl,
            status: ReservationStatus::Pending,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}
