use redis::{aio::MultiplexedConnection, Client};
use std::time::Duration;

// Нижняя граница дедлайна на одну операцию Redis
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(2);
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct RedisClient {
    pub conn: MultiplexedConnection,
}

impl RedisClient {
    pub async fn new(redis_url: &str) -> redis::RedisResult<Self> {
        let client = Client::open(redis_url)?;
        let conn = client
            .get_multiplexed_tokio_connection_with_response_timeouts(
                RESPONSE_TIMEOUT,
                CONNECTION_TIMEOUT,
            )
            .await?;
        Ok(RedisClient { conn })
    }
}
