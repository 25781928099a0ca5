//! Каталог: места, брони и выкупы в Postgres.
//!
//! Все изменения мест - условные UPDATE с полным предикатом (статус, версия,
//! владелец); `rows_affected() == 0` означает, что предикат не выполнился, и
//! превращается в типизированную бизнес-ошибку. Имена таблиц берутся из
//! конфигурации и подставляются в текст запроса.

pub mod bookings;
pub mod reservations;
pub mod seats;

use std::future::Future;

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::config::TablesConfig;
use crate::database::Database;
use crate::error::InventoryError;
use crate::models::{Booking, Reservation, ReservationStatus, Seat, SeatStatus};

/// Операции над таблицей мест.
pub trait SeatStore: Send + Sync {
    fn get_seat(
        &self,
        event_id: &str,
        seat_number: &str,
    ) -> impl Future<Output = Result<Option<Seat>, InventoryError>> + Send;

    /// Скан по событию с фильтром по статусу. Возвращает до `limit` мест и
    /// флаг has_more (задел под курсорную пагинацию).
    fn get_seats(
        &self,
        event_id: &str,
        status: Option<SeatStatus>,
        limit: i64,
    ) -> impl Future<Output = Result<(Vec<Seat>, bool), InventoryError>> + Send;

    /// AVAILABLE + ожидаемая версия -> RESERVED. Иначе `SeatNotAvailable`.
    fn reserve_seat(
        &self,
        event_id: &str,
        seat_number: &str,
        user_id: &str,
        expected_version: i64,
    ) -> impl Future<Output = Result<(), InventoryError>> + Send;

    /// RESERVED этим пользователем -> AVAILABLE. Иначе `NotOwnerOrNotReserved`.
    fn release_seat(
        &self,
        event_id: &str,
        seat_number: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<(), InventoryError>> + Send;

    /// RESERVED этим пользователем -> BOOKED. Иначе `NotOwnerOrNotReserved`.
    fn confirm_seat(
        &self,
        event_id: &str,
        seat_number: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<(), InventoryError>> + Send;

    /// Создаёт места S-0001..S-NNNN с version=0. Повторный запуск
    /// перезаписывает существующие места (идемпотентность не гарантируется).
    fn init_seats(
        &self,
        event_id: &str,
        total_seats: u32,
        price: f64,
    ) -> impl Future<Output = Result<u32, InventoryError>> + Send;
}

/// Операции над таблицей броней.
pub trait ReservationStore: Send + Sync {
    fn create_reservation(
        &self,
        reservation: &Reservation,
    ) -> impl Future<Output = Result<(), InventoryError>> + Send;

    fn get_reservation(
        &self,
        reservation_id: &str,
    ) -> impl Future<Output = Result<Option<Reservation>, InventoryError>> + Send;

    /// Условный терминальный переход PENDING -> `to`.
    /// `Ok(false)` - бронь уже не PENDING.
    fn transition_reservation(
        &self,
        reservation_id: &str,
        to: ReservationStatus,
    ) -> impl Future<Output = Result<bool, InventoryError>> + Send;

    /// PENDING-брони с истёкшим expires_at, старейшие первыми.
    fn expired_pending(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<Reservation>, InventoryError>> + Send;

    /// Брони события (вторичный индекс по event_id).
    fn get_reservations_by_event(
        &self,
        event_id: &str,
    ) -> impl Future<Output = Result<Vec<Reservation>, InventoryError>> + Send;

    /// Брони пользователя (вторичный индекс по user_id).
    fn get_reservations_by_user(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<Reservation>, InventoryError>> + Send;
}

/// Операции над таблицей выкупов.
pub trait BookingStore: Send + Sync {
    fn create_booking(
        &self,
        booking: &Booking,
    ) -> impl Future<Output = Result<(), InventoryError>> + Send;

    fn get_booking_by_reservation(
        &self,
        reservation_id: &str,
    ) -> impl Future<Output = Result<Option<Booking>, InventoryError>> + Send;

    /// Выкупы события (вторичный индекс по event_id).
    fn get_bookings_by_event(
        &self,
        event_id: &str,
    ) -> impl Future<Output = Result<Vec<Booking>, InventoryError>> + Send;

    /// Выкупы пользователя (вторичный индекс по user_id).
    fn get_user_bookings(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<Booking>, InventoryError>> + Send;
}

/// Полный каталог - то, что нужно координатору и риперу.
pub trait Catalog: SeatStore + ReservationStore + BookingStore {}

impl<T: SeatStore + ReservationStore + BookingStore> Catalog for T {}

#[derive(Clone)]
pub struct CatalogStore {
    pub(crate) db: Database,
    pub(crate) tables: TablesConfig,
}

impl CatalogStore {
    pub fn new(db: Database, tables: TablesConfig) -> Self {
        Self { db, tables }
    }
}

fn parse_status<S: std::str::FromStr>(
    field: &'static str,
    value: String,
) -> Result<S, InventoryError> {
    value
        .parse()
        .map_err(|_| InventoryError::CorruptRow { field, value })
}

#[derive(FromRow)]
pub(crate) struct SeatRow {
    event_id: String,
    seat_number: String,
    status: String,
    user_id: Option<String>,
    price: f64,
    reserved_at: Option<DateTime<Utc>>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SeatRow {
    pub(crate) fn into_seat(self) -> Result<Seat, InventoryError> {
        Ok(Seat {
            status: parse_status("seat status", self.status)?,
            event_id: self.event_id,
            seat_number: self.seat_number,
            user_id: self.user_id,
            price: self.price,
            reserved_at: self.reserved_at,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
pub(crate) struct ReservationRow {
    reservation_id: String,
    event_id: String,
    seat_number: String,
    user_id: String,
    price: f64,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    status: String,
}

impl ReservationRow {
    pub(crate) fn into_reservation(self) -> Result<Reservation, InventoryError> {
        Ok(Reservation {
            status: parse_status("reservation status", self.status)?,
            reservation_id: self.reservation_id,
            event_id: self.event_id,
            seat_number: self.seat_number,
            user_id: self.user_id,
            price: self.price,
            created_at: self.created_at,
            expires_at: self.expires_at,
        })
    }
}

#[derive(FromRow)]
pub(crate) struct BookingRow {
    booking_id: String,
    reservation_id: String,
    event_id: String,
    seat_number: String,
    user_id: String,
    price: f64,
    payment_id: String,
    created_at: DateTime<Utc>,
    status: String,
}

impl BookingRow {
    pub(crate) fn into_booking(self) -> Result<Booking, InventoryError> {
        Ok(Booking {
            status: parse_status("booking status", self.status)?,
            booking_id: self.booking_id,
            reservation_id: self.reservation_id,
            event_id: self.event_id,
            seat_number: self.seat_number,
            user_id: self.user_id,
            price: self.price,
            payment_id: self.payment_id,
            created_at: self.created_at,
        })
    }
}
