use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Available,
    Reserved,
    Booked,
}

impl SeatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatStatus::Available => "AVAILABLE",
            SeatStatus::Reserved => "RESERVED",
            SeatStatus::Booked => "BOOKED",
        }
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeatStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(SeatStatus::Available),
            "RESERVED" => Ok(SeatStatus::Reserved),
            "BOOKED" => Ok(SeatStatus::Booked),
            other => Err(other.to_string()),
        }
    }
}

/// Место в каталоге. Ключ - (event_id, seat_number), `version` растёт на 1
/// при каждой успешной записи состояния.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub event_id: String,
    pub seat_number: String,
    pub status: SeatStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Seat {
    /// Номер места по порядковому индексу: 1 -> "S-0001".
    pub fn label(n: u32) -> String {
        format!("S-{:04}", n)
    }
}
