use chrono::{DateTime, Utc};

use crate::error::InventoryError;
use crate::models::{Reservation, ReservationStatus};

use super::{CatalogStore, ReservationRow, ReservationStore};

const RESERVATION_COLUMNS: &str =
    "reservation_id, event_id, seat_number, user_id, price, created_at, expires_at, status";

impl ReservationStore for CatalogStore {
    async fn create_reservation(&self, reservation: &Reservation) -> Result<(), InventoryError> {
        let q = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            self.tables.reservations, RESERVATION_COLUMNS
        );

        sqlx::query(&q)
            .bind(&reservation.reservation_id)
            .bind(&reservation.event_id)
            .bind(&reservation.seat_number)
            .bind(&reservation.user_id)
            .bind(reservation.price)
            .bind(reservation.created_at)
            .bind(reservation.expires_at)
            .bind(reservation.status.as_str())
            .execute(&self.db.pool)
            .await?;

        Ok(())
    }

    async fn get_reservation(
        &self,
        reservation_id: &str,
    ) -> Result<Option<Reservation>, InventoryError> {
        let q = format!(
            "SELECT {} FROM {} WHERE reservation_id = $1",
            RESERVATION_COLUMNS, self.tables.reservations
        );

        let row: Option<ReservationRow> = sqlx::query_as(&q)
            .bind(reservation_id)
            .fetch_optional(&self.db.pool)
            .await?;

        row.map(ReservationRow::into_reservation).transpose()
    }

    async fn transition_reservation(
        &self,
        reservation_id: &str,
        to: ReservationStatus,
    ) -> Result<bool, InventoryError> {
        // переходы разрешены только из PENDING; всё остальное терминально
        let q = format!(
            "UPDATE {} SET status = $1 WHERE reservation_id = $2 AND status = $3",
            self.tables.reservations
        );

        let result = sqlx::query(&q)
            .bind(to.as_str())
            .bind(reservation_id)
            .bind(ReservationStatus::Pending.as_str())
            .execute(&self.db.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn expired_pending(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Reservation>, InventoryError> {
        let q = format!(
            "SELECT {} FROM {} WHERE status = $1 AND expires_at <= $2 ORDER BY expires_at LIMIT $3",
            RESERVATION_COLUMNS, self.tables.reservations
        );

        let rows: Vec<ReservationRow> = sqlx::query_as(&q)
            .bind(ReservationStatus::Pending.as_str())
            .bind(now)
            .bind(limit)
            .fetch_all(&self.db.pool)
            .await?;

        rows.into_iter()
            .map(ReservationRow::into_reservation)
            .collect()
    }

    async fn get_reservations_by_event(
        &self,
        event_id: &str,
    ) -> Result<Vec<Reservation>, InventoryError> {
        let q = format!(
            "SELECT {} FROM {} WHERE event_id = $1 ORDER BY created_at DESC",
            RESERVATION_COLUMNS, self.tables.reservations
        );

        let rows: Vec<ReservationRow> = sqlx::query_as(&q)
            .bind(event_id)
            .fetch_all(&self.db.pool)
            .await?;

        rows.into_iter()
            .map(ReservationRow::into_reservation)
            .collect()
    }

    async fn get_reservations_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Reservation>, InventoryError> {
        let q = format!(
            "SELECT {} FROM {} WHERE user_id = $1 ORDER BY created_at DESC",
            RESERVATION_COLUMNS, self.tables.reservations
        );

        let rows: Vec<ReservationRow> = sqlx::query_as(&q)
            .bind(user_id)
            .fetch_all(&self.db.pool)
            .await?;

        rows.into_iter()
            .map(ReservationRow::into_reservation)
            .collect()
    }
}
