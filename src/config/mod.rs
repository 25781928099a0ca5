use serde::Deserialize;
use std::env;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub tables: TablesConfig,
    pub reservation: ReservationConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub http_port: u16,
    pub environment: String,
    pub rust_log: String,
}

// Настройки базы данных
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Настройки Redis
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

// Имена таблиц каталога
#[derive(Debug, Clone, Deserialize)]
pub struct TablesConfig {
    pub seats: String,
    pub reservations: String,
    pub bookings: String,
}

// Параметры жизненного цикла брони и блокировок
#[derive(Debug, Clone, Deserialize)]
pub struct ReservationConfig {
    pub lock_ttl_seconds: u64,
    pub ttl_minutes: i64,
    pub cleanup_interval_seconds: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                http_port: env::var("HTTP_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .expect("HTTP_PORT must be a valid number"),
                environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "seat_inventory=info,info".to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
                pool_size: env::var("DB_POOL_SIZE")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .expect("DB_POOL_SIZE must be a valid number"),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").expect("REDIS_URL must be set"),
            },
            tables: TablesConfig {
                seats: env::var("SEATS_TABLE").unwrap_or_else(|_| "seats".to_string()),
                reservations: env::var("RESERVATIONS_TABLE")
                    .unwrap_or_else(|_| "reservations".to_string()),
                bookings: env::var("BOOKINGS_TABLE").unwrap_or_else(|_| "bookings".to_string()),
            },
            reservation: ReservationConfig {
                lock_ttl_seconds: env::var("REDIS_LOCK_TTL")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .expect("REDIS_LOCK_TTL must be a valid number"),
                ttl_minutes: env::var("RESERVATION_TTL_MINUTES")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .expect("RESERVATION_TTL_MINUTES must be a valid number"),
                cleanup_interval_seconds: env::var("RESERVATION_CLEANUP_INTERVAL_SECONDS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .expect("RESERVATION_CLEANUP_INTERVAL_SECONDS must be a valid number"),
            },
        }
    }
}
