use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::error::InventoryError;
use crate::lock::{LockGuard, SeatLock};
use crate::models::ReservationStatus;
use crate::store::Catalog;

// Сколько просроченных броней обрабатываем за один тик; остальные
// подберут следующие тики (рипер at-least-once по своей природе)
const BATCH_LIMIT: i64 = 200;

/// Рипер просроченных броней: по таймеру находит PENDING-брони с истёкшим
/// expires_at, возвращает их места и переводит брони в EXPIRED.
pub struct CleanupService<C, L> {
    catalog: C,
    lock: L,
    tick_interval: Duration,
}

#[derive(Debug, Default)]
pub struct CleanupStats {
    pub expired_found: usize,
    pub seats_released: usize,
    pub reservations_expired: usize,
    pub skipped_locked: usize,
}

impl<C, L> CleanupService<C, L>
where
    C: Catalog + Clone + Send + Sync + 'static,
    L: SeatLock + Clone + Send + Sync + 'static,
{
    pub fn new(catalog: C, lock: L, tick_interval: Duration) -> Self {
        Self {
            catalog,
            lock,
            tick_interval,
        }
    }

    /// Цикл рипера. Тело тика ждётся внутри цикла, пропущенные тики
    /// отбрасываются: два тика никогда не идут одновременно.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("🧹 Starting reservation cleanup task");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.run_cleanup_tick().await {
                        Ok(stats) if stats.expired_found > 0 => info!(
                            "🧹 Cleanup tick: {} expired found, {} seats released, {} reservations expired, {} skipped (locked)",
                            stats.expired_found,
                            stats.seats_released,
                            stats.reservations_expired,
                            stats.skipped_locked
                        ),
                        Ok(_) => debug!("cleanup tick: nothing to do"),
                        Err(err) => error!("cleanup tick failed: {}", err),
                    }
                }
                _ = shutdown.changed() => {
                    info!("Stopping reservation cleanup task");
                    return;
                }
            }
        }
    }

    /// Один проход. Каждая бронь обрабатывается под блокировкой её места;
    /// занятая блокировка означает активный поток - бронь откладывается до
    /// следующего тика.
    pub async fn run_cleanup_tick(&self) -> Result<CleanupStats, InventoryError> {
        let expired = self.catalog.expired_pending(Utc::now(), BATCH_LIMIT).await?;

        let mut stats = CleanupStats {
            expired_found: expired.len(),
            ..CleanupStats::default()
        };

        for reservation in expired {
            let guard = match LockGuard::acquire(
                &self.lock,
                &reservation.event_id,
                &reservation.seat_number,
            )
            .await
            {
                Ok(guard) => guard,
                Err(InventoryError::Contended) => {
                    stats.skipped_locked += 1;
                    continue;
                }
                Err(err) => {
                    error!(
                        "cleanup: failed to lock {}/{}: {}",
                        reservation.event_id, reservation.seat_number, err
                    );
                    continue;
                }
            };

            match self
                .catalog
                .release_seat(
                    &reservation.event_id,
                    &reservation.seat_number,
                    &reservation.user_id,
                )
                .await
            {
                Ok(()) => stats.seats_released += 1,
                // место уже BOOKED (успели оплатить) или AVAILABLE (вернули
                // вручную) - для рипера это штатный исход
                Err(InventoryError::NotOwnerOrNotReserved) => debug!(
                    "cleanup: seat {}/{} already moved on, reservation {} expires anyway",
                    reservation.event_id, reservation.seat_number, reservation.reservation_id
                ),
                Err(err) => {
                    error!(
                        "cleanup: failed to release seat {}/{} for reservation {}: {}",
                        reservation.event_id,
                        reservation.seat_number,
                        reservation.reservation_id,
                        err
                    );
                    // бронь остаётся PENDING и попадёт в следующий тик
                    guard.release().await;
                    continue;
                }
            }

            match self
                .catalog
                .transition_reservation(&reservation.reservation_id, ReservationStatus::Expired)
                .await
            {
                Ok(true) => stats.reservations_expired += 1,
                Ok(false) => debug!(
                    "cleanup: reservation {} no longer pending",
                    reservation.reservation_id
                ),
                Err(err) => error!(
                    "cleanup: failed to expire reservation {}: {}",
                    reservation.reservation_id, err
                ),
            }

            guard.release().await;
        }

        Ok(stats)
    }
}
