use crate::error::InventoryError;
use crate::models::Booking;

use super::{BookingRow, BookingStore, CatalogStore};

const BOOKING_COLUMNS: &str =
    "booking_id, reservation_id, event_id, seat_number, user_id, price, payment_id, created_at, status";

impl BookingStore for CatalogStore {
    async fn create_booking(&self, booking: &Booking) -> Result<(), InventoryError> {
        let q = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            self.tables.bookings, BOOKING_COLUMNS
        );

        sqlx::query(&q)
            .bind(&booking.booking_id)
            .bind(&booking.reservation_id)
            .bind(&booking.event_id)
            .bind(&booking.seat_number)
            .bind(&booking.user_id)
            .bind(booking.price)
            .bind(&booking.payment_id)
            .bind(booking.created_at)
            .bind(booking.status.as_str())
            .execute(&self.db.pool)
            .await?;

        Ok(())
    }

    async fn get_booking_by_reservation(
        &self,
        reservation_id: &str,
    ) -> Result<Option<Booking>, InventoryError> {
        let q = format!(
            "SELECT {} FROM {} WHERE reservation_id = $1",
            BOOKING_COLUMNS, self.tables.bookings
        );

        let row: Option<BookingRow> = sqlx::query_as(&q)
            .bind(reservation_id)
            .fetch_optional(&self.db.pool)
            .await?;

        row.map(BookingRow::into_booking).transpose()
    }

    async fn get_bookings_by_event(&self, event_id: &str) -> Result<Vec<Booking>, InventoryError> {
        let q = format!(
            "SELECT {} FROM {} WHERE event_id = $1 ORDER BY created_at DESC",
            BOOKING_COLUMNS, self.tables.bookings
        );

        let rows: Vec<BookingRow> = sqlx::query_as(&q)
            .bind(event_id)
            .fetch_all(&self.db.pool)
            .await?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn get_user_bookings(&self, user_id: &str) -> Result<Vec<Booking>, InventoryError> {
        let q = format!(
            "SELECT {} FROM {} WHERE user_id = $1 ORDER BY created_at DESC",
            BOOKING_COLUMNS, self.tables.bookings
        );

        let rows: Vec<BookingRow> = sqlx::query_as(&q)
            .bind(user_id)
            .fetch_all(&self.db.pool)
            .await?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }
}
