use axum::{extract::State, http::StatusCode, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seat_inventory::{
    config::Config,
    controllers,
    services::cleanup::CleanupService,
    AppState,
};

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.app.rust_log.clone()))
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    info!(
        "Starting seat inventory service ({})",
        config.app.environment
    );

    let app_state = Arc::new(
        AppState::new(config.clone())
            .await
            .expect("Failed to initialize application state"),
    );

    // рипер - единственная фоновая задача; живёт до сигнала остановки
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let cleanup = CleanupService::new(
        app_state.catalog.clone(),
        app_state.locks.clone(),
        Duration::from_secs(config.reservation.cleanup_interval_seconds),
    );
    let cleanup_handle = tokio::spawn(cleanup.run(shutdown_rx));

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .nest("/api", controllers::routes())
        .with_state(app_state.clone());

    let addr: SocketAddr = format!("{}:{}", config.app.host, config.app.http_port)
        .parse()
        .expect("invalid HOST/HTTP_PORT");
    info!("Server listening on http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind listen address");

    let serve_result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await;

    if let Err(err) = serve_result {
        error!("Server error: {}", err);
        std::process::exit(1);
    }

    // даём риперу закончить текущий тик, но не дольше окна остановки
    if tokio::time::timeout(Duration::from_secs(10), cleanup_handle)
        .await
        .is_err()
    {
        error!("Cleanup task did not stop within shutdown window");
    }

    info!("Server shutdown complete");
}

// SIGINT/SIGTERM: остановить приём запросов и просигналить риперу
async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Received shutdown signal, draining...");
    let _ = shutdown_tx.send(true);
}

async fn health_handler() -> &'static str {
    "OK"
}

// готовность = живые Postgres и Redis
async fn ready_handler(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    if sqlx::query("SELECT 1").execute(&state.db.pool).await.is_err() {
        return (StatusCode::SERVICE_UNAVAILABLE, "DB UNAVAILABLE");
    }

    let mut conn = state.redis.conn.clone();
    let pong: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
    if pong.is_err() {
        return (StatusCode::SERVICE_UNAVAILABLE, "REDIS UNAVAILABLE");
    }

    (StatusCode::OK, "READY")
}
