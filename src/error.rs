use thiserror::Error;

/// Ошибки ядра инвентаря. Бизнес-ошибки (устаревшее состояние, конфликт
/// блокировки) отделены от инфраструктурных: первые возвращаются клиенту
/// как `success=false`, вторые - как протокольный сбой.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("seat not found")]
    SeatNotFound,

    #[error("seat is not available")]
    SeatNotAvailable,

    #[error("seat is not reserved by this user")]
    NotOwnerOrNotReserved,

    #[error("reservation not found")]
    ReservationNotFound,

    #[error("reservation has expired")]
    ReservationExpired,

    #[error("reservation is not pending")]
    ReservationNotPending,

    #[error("reservation does not belong to user")]
    NotOwner,

    #[error("seat lock is held by another request")]
    Contended,

    #[error("seat state changed mid-flight")]
    SeatStateDrift,

    #[error("invalid {field} value in catalog row: {value}")]
    CorruptRow { field: &'static str, value: String },

    #[error("background task failed: {0}")]
    Internal(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Redis(#[from] redis::RedisError),
}

impl InventoryError {
    /// Бизнес-ошибка: исход операции, а не сбой системы.
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            InventoryError::SeatNotFound
                | InventoryError::SeatNotAvailable
                | InventoryError::NotOwnerOrNotReserved
                | InventoryError::ReservationNotFound
                | InventoryError::ReservationExpired
                | InventoryError::ReservationNotPending
                | InventoryError::NotOwner
                | InventoryError::Contended
                | InventoryError::SeatStateDrift
        )
    }

    /// Клиент может повторить запрос с backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            InventoryError::Contended
                | InventoryError::Database(_)
                | InventoryError::Redis(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_and_infra_split() {
        assert!(InventoryError::SeatNotAvailable.is_business());
        assert!(InventoryError::Contended.is_business());
        assert!(InventoryError::SeatStateDrift.is_business());
        assert!(!InventoryError::Internal("boom".into()).is_business());
        assert!(!InventoryError::Database(sqlx::Error::PoolClosed).is_business());
    }

    #[test]
    fn contention_is_retryable() {
        assert!(InventoryError::Contended.is_retryable());
        assert!(!InventoryError::SeatNotAvailable.is_retryable());
    }
}
