use chrono::Utc;
use sqlx::QueryBuilder;

use crate::error::InventoryError;
use crate::models::{Seat, SeatStatus};

use super::{CatalogStore, SeatRow, SeatStore};

const SEAT_COLUMNS: &str =
    "event_id, seat_number, status, user_id, price, reserved_at, version, created_at, updated_at";

// Лимит DynamoDB-стиля на пакетную запись
const INIT_BATCH_SIZE: u32 = 25;

impl SeatStore for CatalogStore {
    async fn get_seat(
        &self,
        event_id: &str,
        seat_number: &str,
    ) -> Result<Option<Seat>, InventoryError> {
        let q = format!(
            "SELECT {} FROM {} WHERE event_id = $1 AND seat_number = $2",
            SEAT_COLUMNS, self.tables.seats
        );

        let row: Option<SeatRow> = sqlx::query_as(&q)
            .bind(event_id)
            .bind(seat_number)
            .fetch_optional(&self.db.pool)
            .await?;

        row.map(SeatRow::into_seat).transpose()
    }

    async fn get_seats(
        &self,
        event_id: &str,
        status: Option<SeatStatus>,
        limit: i64,
    ) -> Result<(Vec<Seat>, bool), InventoryError> {
        let mut q = format!(
            "SELECT {} FROM {} WHERE event_id = $1",
            SEAT_COLUMNS, self.tables.seats
        );
        let mut bind_idx = 2;
        if status.is_some() {
            q.push_str(&format!(" AND status = ${}", bind_idx));
            bind_idx += 1;
        }
        q.push_str(&format!(" ORDER BY seat_number LIMIT ${}", bind_idx));

        let mut dbq = sqlx::query_as::<_, SeatRow>(&q).bind(event_id);
        if let Some(st) = status {
            dbq = dbq.bind(st.as_str());
        }

        // выбираем на одну строку больше лимита: лишняя строка = has_more
        let mut rows = dbq.bind(limit + 1).fetch_all(&self.db.pool).await?;

        let has_more = rows.len() as i64 > limit;
        if has_more {
            rows.truncate(limit as usize);
        }

        let seats = rows
            .into_iter()
            .map(SeatRow::into_seat)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((seats, has_more))
    }

    async fn reserve_seat(
        &self,
        event_id: &str,
        seat_number: &str,
        user_id: &str,
        expected_version: i64,
    ) -> Result<(), InventoryError> {
        let q = format!(
            "UPDATE {} \
             SET status = $1, user_id = $2, reserved_at = NOW(), version = version + 1, updated_at = NOW() \
             WHERE event_id = $3 AND seat_number = $4 AND status = $5 AND version = $6",
            self.tables.seats
        );

        let result = sqlx::query(&q)
            .bind(SeatStatus::Reserved.as_str())
            .bind(user_id)
            .bind(event_id)
            .bind(seat_number)
            .bind(SeatStatus::Available.as_str())
            .bind(expected_version)
            .execute(&self.db.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(InventoryError::SeatNotAvailable);
        }
        Ok(())
    }

    async fn release_seat(
        &self,
        event_id: &str,
        seat_number: &str,
        user_id: &str,
    ) -> Result<(), InventoryError> {
        let q = format!(
            "UPDATE {} \
             SET status = $1, user_id = NULL, reserved_at = NULL, version = version + 1, updated_at = NOW() \
             WHERE event_id = $2 AND seat_number = $3 AND status = $4 AND user_id = $5",
            self.tables.seats
        );

        let result = sqlx::query(&q)
            .bind(SeatStatus::Available.as_str())
            .bind(event_id)
            .bind(seat_number)
            .bind(SeatStatus::Reserved.as_str())
            .bind(user_id)
            .execute(&self.db.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(InventoryError::NotOwnerOrNotReserved);
        }
        Ok(())
    }

    async fn confirm_seat(
        &self,
        event_id: &str,
        seat_number: &str,
        user_id: &str,
    ) -> Result<(), InventoryError> {
        let q = format!(
            "UPDATE {} \
             SET status = $1, version = version + 1, updated_at = NOW() \
             WHERE event_id = $2 AND seat_number = $3 AND status = $4 AND user_id = $5",
            self.tables.seats
        );

        let result = sqlx::query(&q)
            .bind(SeatStatus::Booked.as_str())
            .bind(event_id)
            .bind(seat_number)
            .bind(SeatStatus::Reserved.as_str())
            .bind(user_id)
            .execute(&self.db.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(InventoryError::NotOwnerOrNotReserved);
        }
        Ok(())
    }

    async fn init_seats(
        &self,
        event_id: &str,
        total_seats: u32,
        price: f64,
    ) -> Result<u32, InventoryError> {
        let now = Utc::now();
        let mut created = 0u32;

        let numbers: Vec<u32> = (1..=total_seats).collect();
        for chunk in numbers.chunks(INIT_BATCH_SIZE as usize) {
            let mut qb: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
                "INSERT INTO {} (event_id, seat_number, status, user_id, price, reserved_at, version, created_at, updated_at) ",
                self.tables.seats
            ));
            qb.push_values(chunk, |mut b, n| {
                b.push_bind(event_id)
                    .push_bind(Seat::label(*n))
                    .push_bind(SeatStatus::Available.as_str())
                    .push_bind(Option::<String>::None)
                    .push_bind(price)
                    .push_bind(Option::<chrono::DateTime<Utc>>::None)
                    .push_bind(0i64)
                    .push_bind(now)
                    .push_bind(now);
            });
            // семантика put: повторная инициализация перезаписывает места
            qb.push(
                " ON CONFLICT (event_id, seat_number) DO UPDATE SET \
                 status = EXCLUDED.status, user_id = EXCLUDED.user_id, price = EXCLUDED.price, \
                 reserved_at = EXCLUDED.reserved_at, version = EXCLUDED.version, \
                 created_at = EXCLUDED.created_at, updated_at = EXCLUDED.updated_at",
            );

            qb.build().execute(&self.db.pool).await?;
            created += chunk.len() as u32;
        }

        Ok(created)
    }
}
