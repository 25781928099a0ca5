//! reservation.rs
//!
//! Координатор брони мест: многошаговые потоки reserve / release / confirm
//! поверх каталога и сервиса блокировок.
//!
//! Ключевые решения:
//! 1.  **Двухслойная защита**: advisory-блокировка в Redis сужает окно гонки,
//!     условная запись в каталоге по версии остаётся гарантией корректности,
//!     когда блокировка истекла или ушла с partition'ом.
//! 2.  **Критические секции в отдельной задаче**: участок между условной
//!     записью места и записью брони (и компенсация при сбое) выполняется в
//!     spawn'е - отменённый клиентом запрос не может оборвать его на полпути.
//!     Блокировка переезжает в ту же задачу и снимается в её конце, поэтому
//!     обрыв клиента не снимает её, пока секция ещё пишет.
//! 3.  **Компенсация**: если бронь не записалась после успешного захвата
//!     места, место немедленно освобождается; сбой самой компенсации - повод
//!     для ручного вмешательства и пишется в лог с маркером CRITICAL.

use chrono::Duration;
use tracing::{error, warn};
use uuid::Uuid;

use crate::error::InventoryError;
use crate::lock::{LockGuard, SeatLock};
use crate::models::{Booking, Reservation, ReservationStatus, Seat, SeatStatus};
use crate::store::Catalog;

// Ограничение размера выборки GetSeats
const MAX_SCAN_LIMIT: i64 = 1000;
const DEFAULT_SCAN_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct ReservationService<C, L> {
    catalog: C,
    lock: L,
    reservation_ttl: Duration,
}

impl<C, L> ReservationService<C, L>
where
    C: Catalog + Clone + Send + Sync + 'static,
    L: SeatLock + Clone + Send + Sync + 'static,
{
    pub fn new(catalog: C, lock: L, reservation_ttl: Duration) -> Self {
        Self {
            catalog,
            lock,
            reservation_ttl,
        }
    }

    /// Места события, опционально по статусу. Возвращает флаг has_more.
    pub async fn get_seats(
        &self,
        event_id: &str,
        status: Option<SeatStatus>,
        limit: Option<i64>,
    ) -> Result<(Vec<Seat>, bool), InventoryError> {
        let limit = limit.unwrap_or(DEFAULT_SCAN_LIMIT).clamp(1, MAX_SCAN_LIMIT);
        self.catalog.get_seats(event_id, status, limit).await
    }

    /// Снимок одного места.
    pub async fn get_seat(&self, event_id: &str, seat_number: &str) -> Result<Seat, InventoryError> {
        self.catalog
            .get_seat(event_id, seat_number)
            .await?
            .ok_or(InventoryError::SeatNotFound)
    }

    /// Поток резервирования: блокировка -> чтение -> условная запись ->
    /// запись брони. Возвращает reservation_id.
    pub async fn reserve_seat(
        &self,
        event_id: &str,
        seat_number: &str,
        user_id: &str,
    ) -> Result<String, InventoryError> {
        let guard = LockGuard::acquire(&self.lock, event_id, seat_number).await?;

        let seat = self
            .catalog
            .get_seat(event_id, seat_number)
            .await?
            .ok_or(InventoryError::SeatNotFound)?;

        // быстрый путь: не тратим условную запись на заведомо занятое место
        if seat.status != SeatStatus::Available {
            return Err(InventoryError::SeatNotAvailable);
        }

        let catalog = self.catalog.clone();
        let event = event_id.to_string();
        let number = seat_number.to_string();
        let user = user_id.to_string();
        let ttl = self.reservation_ttl;
        let expected_version = seat.version;
        let price = seat.price;

        // критическая секция: отмена запроса не должна оставить место
        // RESERVED без записанной брони; guard живёт в задаче и снимается
        // только после конца секции
        let task = tokio::spawn(async move {
            let result = async {
                // возможна гонка сквозь блокировку (истёкший TTL, рипер) -
                // её ловит предикат по версии
                catalog
                    .reserve_seat(&event, &number, &user, expected_version)
                    .await?;

                let reservation = Reservation::with_ttl(
                    Uuid::new_v4().to_string(),
                    event.clone(),
                    number.clone(),
                    user.clone(),
                    price,
                    ttl,
                );

                if let Err(err) = catalog.create_reservation(&reservation).await {
                    match catalog.release_seat(&event, &number, &user).await {
                        Ok(()) => warn!(
                            "reservation write failed, seat rolled back: event={} seat={} user={}: {}",
                            event, number, user, err
                        ),
                        Err(rollback_err) => error!(
                            "CRITICAL: failed to rollback seat after reservation write failure, \
                             manual intervention required: event={} seat={} user={} put_error={} rollback_error={}",
                            event, number, user, err, rollback_err
                        ),
                    }
                    return Err(err);
                }

                Ok(reservation.reservation_id)
            }
            .await;

            guard.release().await;
            result
        });

        task.await
            .map_err(|err| InventoryError::Internal(err.to_string()))?
    }

    /// Явный возврат места владельцем. Бронь при этом не трогаем: её добьёт
    /// рипер по expires_at.
    pub async fn release_seat(
        &self,
        event_id: &str,
        seat_number: &str,
        user_id: &str,
    ) -> Result<(), InventoryError> {
        let guard = LockGuard::acquire(&self.lock, event_id, seat_number).await?;
        let result = self.catalog.release_seat(event_id, seat_number, user_id).await;
        guard.release().await;
        result
    }

    /// Подтверждение выкупа после оплаты. Возвращает booking_id.
    pub async fn confirm_booking(
        &self,
        reservation_id: &str,
        user_id: &str,
        payment_id: &str,
    ) -> Result<String, InventoryError> {
        let reservation = self
            .catalog
            .get_reservation(reservation_id)
            .await?
            .ok_or(InventoryError::ReservationNotFound)?;

        if reservation.is_expired() {
            return Err(InventoryError::ReservationExpired);
        }
        if reservation.user_id != user_id {
            return Err(InventoryError::NotOwner);
        }
        // защита от повторного confirm и confirm после cancel
        if reservation.status != ReservationStatus::Pending {
            return Err(InventoryError::ReservationNotPending);
        }

        let guard =
            LockGuard::acquire(&self.lock, &reservation.event_id, &reservation.seat_number).await?;

        let catalog = self.catalog.clone();
        let payment = payment_id.to_string();

        // критическая секция вместе с блокировкой уезжает в задачу: обрыв
        // клиента не снимает lock, пока секция не закончила писать
        let task = tokio::spawn(async move {
            let result = async {
                match catalog
                    .confirm_seat(
                        &reservation.event_id,
                        &reservation.seat_number,
                        &reservation.user_id,
                    )
                    .await
                {
                    Ok(()) => {}
                    // место увёл рипер или другой поток - запрос потерял смысл
                    Err(InventoryError::NotOwnerOrNotReserved) => {
                        return Err(InventoryError::SeatStateDrift)
                    }
                    Err(err) => return Err(err),
                }

                let booking =
                    Booking::confirmed(Uuid::new_v4().to_string(), &reservation, &payment);

                if let Err(err) = catalog.create_booking(&booking).await {
                    // место уже BOOKED; откатывать нельзя - ложный AVAILABLE на
                    // оплаченном месте хуже зависшего BOOKED
                    error!(
                        "CRITICAL: booking write failed after seat confirm, manual reconciliation \
                         required: event={} seat={} user={} reservation={} payment={}: {}",
                        reservation.event_id,
                        reservation.seat_number,
                        reservation.user_id,
                        reservation.reservation_id,
                        payment,
                        err
                    );
                    return Err(err);
                }

                // booking уже авторитетен, сбой статуса брони не роняет поток
                match catalog
                    .transition_reservation(
                        &reservation.reservation_id,
                        ReservationStatus::Confirmed,
                    )
                    .await
                {
                    Ok(true) => {}
                    Ok(false) => warn!(
                        "reservation {} no longer pending while finalizing confirm",
                        reservation.reservation_id
                    ),
                    Err(err) => warn!(
                        "failed to update reservation {} status: {}",
                        reservation.reservation_id, err
                    ),
                }

                Ok(booking.booking_id)
            }
            .await;

            guard.release().await;
            result
        });

        task.await
            .map_err(|err| InventoryError::Internal(err.to_string()))?
    }

    /// Booking, созданный по данной брони (ответ на повторный confirm).
    pub async fn booking_for_reservation(
        &self,
        reservation_id: &str,
    ) -> Result<Option<Booking>, InventoryError> {
        self.catalog.get_booking_by_reservation(reservation_id).await
    }

    /// Выкупы пользователя.
    pub async fn user_bookings(&self, user_id: &str) -> Result<Vec<Booking>, InventoryError> {
        self.catalog.get_user_bookings(user_id).await
    }

    /// Выкупы события.
    pub async fn event_bookings(&self, event_id: &str) -> Result<Vec<Booking>, InventoryError> {
        self.catalog.get_bookings_by_event(event_id).await
    }

    /// Брони пользователя.
    pub async fn user_reservations(
        &self,
        user_id: &str,
    ) -> Result<Vec<Reservation>, InventoryError> {
        self.catalog.get_reservations_by_user(user_id).await
    }

    /// Брони события.
    pub async fn event_reservations(
        &self,
        event_id: &str,
    ) -> Result<Vec<Reservation>, InventoryError> {
        self.catalog.get_reservations_by_event(event_id).await
    }

    /// Инициализация мест события. Перезаписывает существующие места.
    pub async fn initialize_seats(
        &self,
        event_id: &str,
        total_seats: u32,
        price: f64,
    ) -> Result<u32, InventoryError> {
        self.catalog.init_seats(event_id, total_seats, price).await
    }
}
