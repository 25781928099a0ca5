pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod lock;
pub mod models;
pub mod redis_client;
pub mod services;
pub mod store;

#[cfg(test)]
pub mod test_support;

use chrono::Duration;

use lock::LockService;
use services::reservation::ReservationService;
use store::CatalogStore;

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub redis: redis_client::RedisClient,
    pub catalog: CatalogStore,
    pub locks: LockService,
    pub inventory: ReservationService<CatalogStore, LockService>,
    pub config: config::Config,
}

impl AppState {
    pub async fn new(config: config::Config) -> Result<Self, Box<dyn std::error::Error>> {
        let db = database::Database::new(&config.database.url, config.database.pool_size).await?;
        db.run_migrations().await?;

        let redis = redis_client::RedisClient::new(&config.redis.url).await?;

        let catalog = CatalogStore::new(db.clone(), config.tables.clone());
        let locks = LockService::new(redis.clone(), config.reservation.lock_ttl_seconds);
        let inventory = ReservationService::new(
            catalog.clone(),
            locks.clone(),
            Duration::minutes(config.reservation.ttl_minutes),
        );

        Ok(AppState {
            db,
            redis,
            catalog,
            locks,
            inventory,
            config,
        })
    }
}
