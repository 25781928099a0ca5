//! Распределённая блокировка места поверх Redis.
//!
//! Блокировка advisory: источником истины остаётся каталог с условными
//! записями, Redis лишь сжимает окно конфликтов между чтением и условной
//! записью. Токен нужен для fencing: клиент, чья блокировка истекла и была
//! перехвачена, не может снять чужую.

use std::future::Future;

use tracing::warn;
use uuid::Uuid;

use crate::error::InventoryError;
use crate::redis_client::RedisClient;

pub trait SeatLock: Send + Sync {
    /// Атомарно ставит блокировку, если её нет. `Err(Contended)` - занято.
    fn acquire(
        &self,
        event_id: &str,
        seat_number: &str,
    ) -> impl Future<Output = Result<String, InventoryError>> + Send;

    /// Атомарно снимает блокировку, если токен совпадает.
    /// `Ok(false)` - блокировки с этим токеном уже нет.
    fn release(
        &self,
        event_id: &str,
        seat_number: &str,
        token: &str,
    ) -> impl Future<Output = Result<bool, InventoryError>> + Send;

    /// Атомарно продлевает TTL, если токен совпадает.
    fn extend(
        &self,
        event_id: &str,
        seat_number: &str,
        token: &str,
    ) -> impl Future<Output = Result<bool, InventoryError>> + Send;
}

pub fn lock_key(event_id: &str, seat_number: &str) -> String {
    format!("lock:seat:{}:{}", event_id, seat_number)
}

// Сравнить-и-удалить одним шагом: наивный GET+DEL может снять чужую
// блокировку, перехваченную после истечения TTL.
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

const EXTEND_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("EXPIRE", KEYS[1], ARGV[2])
else
    return 0
end
"#;

#[derive(Clone)]
pub struct LockService {
    redis: RedisClient,
    ttl_seconds: u64,
}

impl LockService {
    pub fn new(redis: RedisClient, ttl_seconds: u64) -> Self {
        Self { redis, ttl_seconds }
    }
}

impl SeatLock for LockService {
    async fn acquire(&self, event_id: &str, seat_number: &str) -> Result<String, InventoryError> {
        let mut conn = self.redis.conn.clone();
        let key = lock_key(event_id, seat_number);
        let token = Uuid::new_v4().to_string();

        // SET NX: поставить только если ключа нет
        let result: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(&token)
            .arg("NX")
            .arg("EX")
            .arg(self.ttl_seconds)
            .query_async(&mut conn)
            .await?;

        if result.is_some() {
            Ok(token)
        } else {
            Err(InventoryError::Contended)
        }
    }

    async fn release(
        &self,
        event_id: &str,
        seat_number: &str,
        token: &str,
    ) -> Result<bool, InventoryError> {
        let mut conn = self.redis.conn.clone();
        let key = lock_key(event_id, seat_number);

        let deleted: i64 = redis::Script::new(RELEASE_SCRIPT)
            .key(&key)
            .arg(token)
            .invoke_async(&mut conn)
            .await?;

        Ok(deleted == 1)
    }

    async fn extend(
        &self,
        event_id: &str,
        seat_number: &str,
        token: &str,
    ) -> Result<bool, InventoryError> {
        let mut conn = self.redis.conn.clone();
        let key = lock_key(event_id, seat_number);

        let extended: i64 = redis::Script::new(EXTEND_SCRIPT)
            .key(&key)
            .arg(token)
            .arg(self.ttl_seconds)
            .invoke_async(&mut conn)
            .await?;

        Ok(extended == 1)
    }
}

/// Scoped-блокировка: явный `release().await` на обычном пути, а при раннем
/// выходе (ошибка, panic, отменённый запрос) Drop отправляет снятие отдельной
/// задачей, чтобы блокировка не висела до конца TTL.
pub struct LockGuard<L>
where
    L: SeatLock + Clone + Send + 'static,
{
    lock: L,
    event_id: String,
    seat_number: String,
    token: Option<String>,
}

impl<L> LockGuard<L>
where
    L: SeatLock + Clone + Send + 'static,
{
    pub async fn acquire(lock: &L, event_id: &str, seat_number: &str) -> Result<Self, InventoryError> {
        let token = lock.acquire(event_id, seat_number).await?;
        Ok(LockGuard {
            lock: lock.clone(),
            event_id: event_id.to_string(),
            seat_number: seat_number.to_string(),
            token: Some(token),
        })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Снять блокировку. `NOT_HELD` не ошибка: TTL мог истечь по дороге.
    pub async fn release(mut self) {
        if let Some(token) = self.token.take() {
            match self.lock.release(&self.event_id, &self.seat_number, &token).await {
                Ok(_) => {}
                Err(err) => warn!(
                    "failed to release lock for {}/{}: {}",
                    self.event_id, self.seat_number, err
                ),
            }
        }
    }
}

impl<L> Drop for LockGuard<L>
where
    L: SeatLock + Clone + Send + 'static,
{
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            let lock = self.lock.clone();
            let event_id = std::mem::take(&mut self.event_id);
            let seat_number = std::mem::take(&mut self.seat_number);
            tokio::spawn(async move {
                if let Err(err) = lock.release(&event_id, &seat_number, &token).await {
                    warn!(
                        "failed to release lock for {}/{}: {}",
                        event_id, seat_number, err
                    );
                }
            });
        }
    }
}
