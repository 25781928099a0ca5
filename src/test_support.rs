//! In-memory реализации каталога и блокировок для тестов.
//!
//! Контракты те же, что у Postgres/Redis-реализаций: условные записи мест с
//! проверкой версии и владельца, терминальные переходы броней, токен-fencing
//! и TTL у блокировок. Только для тестов.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::InventoryError;
use crate::lock::SeatLock;
use crate::models::{Booking, Reservation, ReservationStatus, Seat, SeatStatus};
use crate::store::{BookingStore, ReservationStore, SeatStore};

#[derive(Default)]
struct Inner {
    seats: HashMap<(String, String), Seat>,
    reservations: HashMap<String, Reservation>,
    bookings: HashMap<String, Booking>,
}

#[derive(Clone, Default)]
pub struct MemoryCatalog {
    inner: Arc<Mutex<Inner>>,
    fail_reservation_puts: Arc<AtomicBool>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Фолт-инъекция: записи броней начинают падать.
    pub fn fail_reservation_puts(&self, on: bool) {
        self.fail_reservation_puts.store(on, Ordering::SeqCst);
    }

    pub fn seat(&self, event_id: &str, seat_number: &str) -> Option<Seat> {
        let inner = self.inner.lock().unwrap();
        inner
            .seats
            .get(&(event_id.to_string(), seat_number.to_string()))
            .cloned()
    }

    /// Вставка/перезапись места напрямую, минуя условные проверки.
    pub fn insert_seat(&self, seat: Seat) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .seats
            .insert((seat.event_id.clone(), seat.seat_number.clone()), seat);
    }

    pub fn reservation(&self, reservation_id: &str) -> Option<Reservation> {
        let inner = self.inner.lock().unwrap();
        inner.reservations.get(reservation_id).cloned()
    }

    /// Вставка/перезапись брони напрямую.
    pub fn insert_reservation(&self, reservation: Reservation) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .reservations
            .insert(reservation.reservation_id.clone(), reservation);
    }

    pub fn pending_reservations(&self) -> Vec<Reservation> {
        let inner = self.inner.lock().unwrap();
        inner
            .reservations
            .values()
            .filter(|r| r.status == ReservationStatus::Pending)
            .cloned()
            .collect()
    }

    pub fn bookings_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.bookings.len()
    }
}

impl SeatStore for MemoryCatalog {
    async fn get_seat(
        &self,
        event_id: &str,
        seat_number: &str,
    ) -> Result<Option<Seat>, InventoryError> {
        Ok(self.seat(event_id, seat_number))
    }

    async fn get_seats(
        &self,
        event_id: &str,
        status: Option<SeatStatus>,
        limit: i64,
    ) -> Result<(Vec<Seat>, bool), InventoryError> {
        let inner = self.inner.lock().unwrap();
        let mut seats: Vec<Seat> = inner
            .seats
            .values()
            .filter(|s| s.event_id == event_id)
            .filter(|s| status.map_or(true, |st| s.status == st))
            .cloned()
            .collect();
        seats.sort_by(|a, b| a.seat_number.cmp(&b.seat_number));

        let has_more = seats.len() as i64 > limit;
        seats.truncate(limit as usize);
        Ok((seats, has_more))
    }

    async fn reserve_seat(
        &self,
        event_id: &str,
        seat_number: &str,
        user_id: &str,
        expected_version: i64,
    ) -> Result<(), InventoryError> {
        let mut inner = self.inner.lock().unwrap();
        let seat = inner
            .seats
            .get_mut(&(event_id.to_string(), seat_number.to_string()));
        match seat {
            Some(seat)
                if seat.status == SeatStatus::Available && seat.version == expected_version =>
            {
                let now = Utc::now();
                seat.status = SeatStatus::Reserved;
                seat.user_id = Some(user_id.to_string());
                seat.reserved_at = Some(now);
                seat.version += 1;
                seat.updated_at = now;
                Ok(())
            }
            _ => Err(InventoryError::SeatNotAvailable),
        }
    }

    async fn release_seat(
        &self,
        event_id: &str,
        seat_number: &str,
        user_id: &str,
    ) -> Result<(), InventoryError> {
        let mut inner = self.inner.lock().unwrap();
        let seat = inner
            .seats
            .get_mut(&(event_id.to_string(), seat_number.to_string()));
        match seat {
            Some(seat)
                if seat.status == SeatStatus::Reserved
                    && seat.user_id.as_deref() == Some(user_id) =>
            {
                seat.status = SeatStatus::Available;
                seat.user_id = None;
                seat.reserved_at = None;
                seat.version += 1;
                seat.updated_at = Utc::now();
                Ok(())
            }
            _ => Err(InventoryError::NotOwnerOrNotReserved),
        }
    }

    async fn confirm_seat(
        &self,
        event_id: &str,
        seat_number: &str,
        user_id: &str,
    ) -> Result<(), InventoryError> {
        let mut inner = self.inner.lock().unwrap();
        let seat = inner
            .seats
            .get_mut(&(event_id.to_string(), seat_number.to_string()));
        match seat {
            Some(seat)
                if seat.status == SeatStatus::Reserved
                    && seat.user_id.as_deref() == Some(user_id) =>
            {
                seat.status = SeatStatus::Booked;
                seat.version += 1;
                seat.updated_at = Utc::now();
                Ok(())
            }
            _ => Err(InventoryError::NotOwnerOrNotReserved),
        }
    }

    async fn init_seats(
        &self,
        event_id: &str,
        total_seats: u32,
        price: f64,
    ) -> Result<u32, InventoryError> {
        let now = Utc::now();
        let mut inner = self.inner.lock().unwrap();
        for n in 1..=total_seats {
            let seat = Seat {
                event_id: event_id.to_string(),
                seat_number: Seat::label(n),
                status: SeatStatus::Available,
                user_id: None,
                price,
                reserved_at: None,
                version: 0,
                created_at: now,
                updated_at: now,
            };
            inner
                .seats
                .insert((seat.event_id.clone(), seat.seat_number.clone()), seat);
        }
        Ok(total_seats)
    }
}

impl ReservationStore for MemoryCatalog {
    async fn create_reservation(&self, reservation: &Reservation) -> Result<(), InventoryError> {
        if self.fail_reservation_puts.load(Ordering::SeqCst) {
            return Err(InventoryError::Internal(
                "injected reservation write failure".to_string(),
            ));
        }
        self.insert_reservation(reservation.clone());
        Ok(())
    }

    async fn get_reservation(
        &self,
        reservation_id: &str,
    ) -> Result<Option<Reservation>, InventoryError> {
        Ok(self.reservation(reservation_id))
    }

    async fn transition_reservation(
        &self,
        reservation_id: &str,
        to: ReservationStatus,
    ) -> Result<bool, InventoryError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.reservations.get_mut(reservation_id) {
            Some(r) if r.status == ReservationStatus::Pending => {
                r.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn expired_pending(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Reservation>, InventoryError> {
        let inner = self.inner.lock().unwrap();
        let mut expired: Vec<Reservation> = inner
            .reservations
            .values()
            .filter(|r| r.status == ReservationStatus::Pending && r.expires_at <= now)
            .cloned()
            .collect();
        expired.sort_by_key(|r| r.expires_at);
        expired.truncate(limit as usize);
        Ok(expired)
    }

    async fn get_reservations_by_event(
        &self,
        event_id: &str,
    ) -> Result<Vec<Reservation>, InventoryError> {
        let inner = self.inner.lock().unwrap();
        let mut reservations: Vec<Reservation> = inner
            .reservations
            .values()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect();
        reservations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reservations)
    }

    async fn get_reservations_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Reservation>, InventoryError> {
        let inner = self.inner.lock().unwrap();
        let mut reservations: Vec<Reservation> = inner
            .reservations
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reservations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reservations)
    }
}

impl BookingStore for MemoryCatalog {
    async fn create_booking(&self, booking: &Booking) -> Result<(), InventoryError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .bookings
            .insert(booking.booking_id.clone(), booking.clone());
        Ok(())
    }

    async fn get_booking_by_reservation(
        &self,
        reservation_id: &str,
    ) -> Result<Option<Booking>, InventoryError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .bookings
            .values()
            .find(|b| b.reservation_id == reservation_id)
            .cloned())
    }

    async fn get_bookings_by_event(&self, event_id: &str) -> Result<Vec<Booking>, InventoryError> {
        let inner = self.inner.lock().unwrap();
        let mut bookings: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|b| b.event_id == event_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn get_user_bookings(&self, user_id: &str) -> Result<Vec<Booking>, InventoryError> {
        let inner = self.inner.lock().unwrap();
        let mut bookings: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }
}

/// In-memory блокировки с токенами и TTL.
#[derive(Clone)]
pub struct MemoryLock {
    held: Arc<Mutex<HashMap<(String, String), (String, DateTime<Utc>)>>>,
    ttl: Duration,
}

impl MemoryLock {
    pub fn with_ttl_seconds(secs: i64) -> Self {
        Self {
            held: Arc::new(Mutex::new(HashMap::new())),
            ttl: Duration::seconds(secs),
        }
    }
}

impl Default for MemoryLock {
    fn default() -> Self {
        Self::with_ttl_seconds(30)
    }
}

impl SeatLock for MemoryLock {
    async fn acquire(&self, event_id: &str, seat_number: &str) -> Result<String, InventoryError> {
        let mut held = self.held.lock().unwrap();
        let key = (event_id.to_string(), seat_number.to_string());
        let now = Utc::now();

        // истёкшие записи исчезают молча, как в Redis
        if let Some((_, expires_at)) = held.get(&key) {
            if *expires_at > now {
                return Err(InventoryError::Contended);
            }
            held.remove(&key);
        }

        let token = Uuid::new_v4().to_string();
        held.insert(key, (token.clone(), now + self.ttl));
        Ok(token)
    }

    async fn release(
        &self,
        event_id: &str,
        seat_number: &str,
        token: &str,
    ) -> Result<bool, InventoryError> {
        let mut held = self.held.lock().unwrap();
        let key = (event_id.to_string(), seat_number.to_string());
        match held.get(&key) {
            Some((held_token, _)) if held_token == token => {
                held.remove(&key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn extend(
        &self,
        event_id: &str,
        seat_number: &str,
        token: &str,
    ) -> Result<bool, InventoryError> {
        let mut held = self.held.lock().unwrap();
        let key = (event_id.to_string(), seat_number.to_string());
        match held.get_mut(&key) {
            Some((held_token, expires_at)) if held_token == token => {
                *expires_at = Utc::now() + self.ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
